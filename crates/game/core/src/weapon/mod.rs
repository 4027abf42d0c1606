//! Weapon state machine.
//!
//! A [`Weapon`] is pure state: every transition takes a [`WeaponContext`]
//! describing its surroundings and pushes [`WeaponEffect`]s for the world to
//! apply (timers, cues, ammo movement, forwarded intents). The same code runs on
//! the authority and on the owning client; the context flags decide which parts
//! each side performs.
//!
//! The owning client predicts shots and magazine use. The authority re-validates
//! each reported shot, owns the magazine count, refills it from the owner's
//! inventory once per reload, and is the only side whose shots deal damage.
mod spec;

pub use spec::{WeaponContext, WeaponCue, WeaponEffect, WeaponIntent, WeaponSpec, WeaponState};

use tracing::trace;

use crate::config::GameConfig;
use crate::error::{NotReadyReason, Rejection};
use crate::timer::TimerPurpose;
use crate::types::{EntityId, ItemId, Millis};

/// Replicated description of an equipped weapon.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponSnapshot {
    pub entity: EntityId,
    pub item: ItemId,
    pub spec: WeaponSpec,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Weapon {
    entity: EntityId,
    /// Back-reference to the wielding character; lookup only.
    owner: EntityId,
    item: ItemId,
    spec: WeaponSpec,
    state: WeaponState,
    ammo_in_magazine: u32,
    burst_counter: u32,
    last_fire: Option<Millis>,
    /// Earliest time the authority confirms the next reported shot.
    next_confirmed_shot: Option<Millis>,
    wants_to_fire: bool,
    pending_reload: bool,
    pending_equip: bool,
    equipped: bool,
    refiring: bool,
}

impl Weapon {
    pub fn new(entity: EntityId, owner: EntityId, item: ItemId, spec: WeaponSpec) -> Self {
        Self {
            entity,
            owner,
            item,
            spec,
            state: WeaponState::Idle,
            ammo_in_magazine: 0,
            burst_counter: 0,
            last_fire: None,
            next_confirmed_shot: None,
            wants_to_fire: false,
            pending_reload: false,
            pending_equip: false,
            equipped: false,
            refiring: false,
        }
    }

    pub fn from_snapshot(owner: EntityId, snapshot: &WeaponSnapshot) -> Self {
        Self::new(snapshot.entity, owner, snapshot.item, snapshot.spec.clone())
    }

    pub fn snapshot(&self) -> WeaponSnapshot {
        WeaponSnapshot {
            entity: self.entity,
            item: self.item,
            spec: self.spec.clone(),
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn item(&self) -> ItemId {
        self.item
    }

    pub fn spec(&self) -> &WeaponSpec {
        &self.spec
    }

    pub fn state(&self) -> WeaponState {
        self.state
    }

    pub fn ammo_in_magazine(&self) -> u32 {
        self.ammo_in_magazine
    }

    pub fn burst_counter(&self) -> u32 {
        self.burst_counter
    }

    pub fn last_fire(&self) -> Option<Millis> {
        self.last_fire
    }

    pub fn is_equipped(&self) -> bool {
        self.equipped
    }

    pub fn is_pending_reload(&self) -> bool {
        self.pending_reload
    }

    pub fn wants_to_fire(&self) -> bool {
        self.wants_to_fire
    }

    /// Starts the weapon with `ammo` rounds already chambered, clamped to capacity.
    pub fn with_magazine(mut self, ammo: u32) -> Self {
        self.ammo_in_magazine = ammo.min(self.spec.magazine_capacity);
        self
    }

    pub fn can_fire(&self, ctx: &WeaponContext) -> bool {
        ctx.owner_alive
            && self.equipped
            && matches!(self.state, WeaponState::Idle | WeaponState::Firing)
            && !self.pending_reload
            && self.ammo_in_magazine > 0
    }

    pub fn can_reload(&self, ctx: &WeaponContext) -> bool {
        self.reload_blocker(ctx).is_none()
    }

    /// Why a reload would be refused right now, if it would.
    pub fn reload_blocker(&self, ctx: &WeaponContext) -> Option<NotReadyReason> {
        if !ctx.owner_alive || !self.equipped {
            return Some(NotReadyReason::NoWeapon);
        }
        if !matches!(self.state, WeaponState::Idle | WeaponState::Firing) {
            return Some(NotReadyReason::Busy(self.state));
        }
        if self.ammo_in_magazine >= self.spec.magazine_capacity {
            return Some(NotReadyReason::MagazineFull);
        }
        if ctx.reserve == 0 {
            return Some(NotReadyReason::NoReserveAmmo);
        }
        None
    }

    /// Trigger pressed.
    ///
    /// A press that cannot start a burst on the controlling replica either
    /// begins a reload (empty magazine, reserve available) or plays the
    /// out-of-ammo cue once for this press.
    pub fn start_fire(
        &mut self,
        ctx: &WeaponContext,
        out: &mut Vec<WeaponEffect>,
    ) -> Result<(), Rejection> {
        if !ctx.authority {
            out.push(WeaponEffect::Forward(WeaponIntent::StartFire));
        }
        let busy = matches!(
            self.state,
            WeaponState::Reloading | WeaponState::Equipping
        );
        if !self.wants_to_fire {
            self.wants_to_fire = true;
            self.determine_state(ctx, out);
        }

        if busy && ctx.local {
            return Err(Rejection::NotReady(NotReadyReason::Busy(self.state)));
        }
        if self.state != WeaponState::Idle || !ctx.local {
            return Ok(());
        }
        if self.ammo_in_magazine == 0 {
            if self.can_reload(ctx) {
                return self.start_reload(ctx, out);
            }
            out.push(WeaponEffect::Cue(WeaponCue::OutOfAmmo));
            let rejection = Rejection::NotReady(NotReadyReason::OutOfAmmo);
            out.push(WeaponEffect::Notify(rejection));
            return Err(rejection);
        }
        Ok(())
    }

    /// Trigger released.
    pub fn stop_fire(&mut self, ctx: &WeaponContext, out: &mut Vec<WeaponEffect>) {
        if !ctx.authority {
            out.push(WeaponEffect::Forward(WeaponIntent::StopFire));
        }
        if self.wants_to_fire {
            self.wants_to_fire = false;
            self.determine_state(ctx, out);
        }
    }

    /// Requests a reload, refusing with a player-facing reason when blocked.
    pub fn start_reload(
        &mut self,
        ctx: &WeaponContext,
        out: &mut Vec<WeaponEffect>,
    ) -> Result<(), Rejection> {
        if let Some(reason) = self.reload_blocker(ctx) {
            let rejection = Rejection::NotReady(reason);
            if ctx.local {
                out.push(WeaponEffect::Notify(rejection));
            }
            return Err(rejection);
        }
        if !ctx.authority {
            out.push(WeaponEffect::Forward(WeaponIntent::StartReload));
        }

        self.pending_reload = true;
        self.determine_state(ctx, out);

        let duration = self.reload_duration();
        out.push(WeaponEffect::Cue(WeaponCue::Reload));
        out.push(WeaponEffect::Schedule {
            purpose: TimerPurpose::ReloadFinish,
            delay: duration,
        });
        if ctx.authority {
            let transfer = duration
                .saturating_sub(ctx.transfer_lead)
                .max(ctx.min_transfer)
                .min(duration);
            out.push(WeaponEffect::Schedule {
                purpose: TimerPurpose::ReloadTransfer,
                delay: transfer,
            });
        }
        Ok(())
    }

    /// Reload animation finished.
    pub fn finish_reload(&mut self, ctx: &WeaponContext, out: &mut Vec<WeaponEffect>) {
        let was_reloading = self.state == WeaponState::Reloading;
        self.pending_reload = false;
        if was_reloading {
            self.determine_state(ctx, out);
        }
    }

    /// Moves ammo from the reserve into the magazine. Authority only.
    ///
    /// Returns the number of rounds moved.
    pub fn transfer_ammo(&mut self, ctx: &WeaponContext, out: &mut Vec<WeaponEffect>) -> u32 {
        debug_assert!(ctx.authority, "magazine refilled on an observer");
        let delta = self
            .spec
            .magazine_capacity
            .saturating_sub(self.ammo_in_magazine)
            .min(ctx.reserve);
        if delta > 0 {
            self.ammo_in_magazine += delta;
            out.push(WeaponEffect::TransferAmmo(delta));
        }
        delta
    }

    /// Refire timer expired while the trigger is held.
    pub fn refire(&mut self, ctx: &WeaponContext, out: &mut Vec<WeaponEffect>) {
        if self.state == WeaponState::Firing {
            self.handle_firing(ctx, out);
        }
    }

    /// Authority side of a shot reported by the owning client.
    ///
    /// The shot is re-validated against the authority's own magazine, state and
    /// fire rate; only a confirmed shot deals damage.
    pub fn confirm_shot(
        &mut self,
        ctx: &WeaponContext,
        out: &mut Vec<WeaponEffect>,
    ) -> Result<(), Rejection> {
        debug_assert!(ctx.authority, "shot confirmed on an observer");
        if !self.can_fire(ctx) {
            let reason = if self.ammo_in_magazine == 0 {
                NotReadyReason::OutOfAmmo
            } else {
                NotReadyReason::Busy(self.state)
            };
            return Err(Rejection::NotReady(reason));
        }
        if !self.take_shot_slot(ctx) {
            trace!(target: "core::weapon", weapon = %self.entity, now = %ctx.now, "shot ahead of fire rate");
            return Err(Rejection::NotReady(NotReadyReason::FireRate));
        }
        self.ammo_in_magazine -= 1;
        self.burst_counter += 1;
        self.last_fire = Some(ctx.now);
        out.push(WeaponEffect::Shot {
            authoritative: true,
        });
        Ok(())
    }

    /// Weapon attached to its owner; the equip animation starts.
    pub fn equip(&mut self, ctx: &WeaponContext, out: &mut Vec<WeaponEffect>) {
        self.pending_equip = true;
        self.determine_state(ctx, out);
        out.push(WeaponEffect::Cue(WeaponCue::Equip));
        out.push(WeaponEffect::Schedule {
            purpose: TimerPurpose::EquipFinish,
            delay: self.equip_duration(),
        });
    }

    /// Reserves the next slot of the fire rate for a reported shot.
    ///
    /// Shots may run up to `shot_tolerance` ahead of the schedule, which covers
    /// several shots arriving in one batch. Semi-automatic weapons are not paced.
    fn take_shot_slot(&mut self, ctx: &WeaponContext) -> bool {
        let interval = self.spec.time_between_shots;
        if interval.is_zero() {
            return true;
        }
        let earliest = self.next_confirmed_shot.unwrap_or(ctx.now);
        if earliest > ctx.now + ctx.shot_tolerance {
            return false;
        }
        self.next_confirmed_shot = Some(earliest.max(ctx.now) + interval);
        true
    }

    /// Equip animation finished. An empty magazine reloads right away.
    pub fn finish_equip(&mut self, ctx: &WeaponContext, out: &mut Vec<WeaponEffect>) {
        self.equipped = true;
        self.pending_equip = false;
        self.determine_state(ctx, out);

        if ctx.local && self.ammo_in_magazine == 0 && self.can_reload(ctx) {
            let _ = self.start_reload(ctx, out);
        }
    }

    /// Weapon detached from its owner.
    ///
    /// Cancels every pending timer, forces `Idle`, and on the authority returns
    /// the magazine to the owner's reserve. Returns the rounds returned.
    pub fn unequip(&mut self, ctx: &WeaponContext, out: &mut Vec<WeaponEffect>) -> u32 {
        self.equipped = false;
        self.wants_to_fire = false;
        self.pending_equip = false;
        if std::mem::take(&mut self.pending_reload) {
            out.push(WeaponEffect::Cue(WeaponCue::ReloadStop));
        }
        for purpose in [
            TimerPurpose::ReloadFinish,
            TimerPurpose::ReloadTransfer,
            TimerPurpose::EquipFinish,
            TimerPurpose::Refire,
        ] {
            out.push(WeaponEffect::Cancel(purpose));
        }

        let returned = if ctx.authority {
            std::mem::take(&mut self.ammo_in_magazine)
        } else {
            0
        };
        if returned > 0 {
            out.push(WeaponEffect::ReturnAmmo(returned));
        }

        self.determine_state(ctx, out);
        returned
    }

    /// Authority pushed a new magazine count (owner only).
    pub fn apply_magazine(&mut self, ammo: u32) {
        self.ammo_in_magazine = ammo.min(self.spec.magazine_capacity);
    }

    /// Authority pushed a new burst counter (remote observers only).
    pub fn apply_burst_counter(&mut self, counter: u32, out: &mut Vec<WeaponEffect>) {
        self.burst_counter = counter;
        let cue = if counter > 0 {
            WeaponCue::Fire
        } else {
            WeaponCue::FireStop
        };
        out.push(WeaponEffect::Cue(cue));
    }

    /// Authority pushed the reload flag (remote observers only).
    pub fn apply_pending_reload(&mut self, pending: bool, out: &mut Vec<WeaponEffect>) {
        if pending == self.pending_reload {
            return;
        }
        self.pending_reload = pending;
        if pending {
            self.state = WeaponState::Reloading;
            out.push(WeaponEffect::Cue(WeaponCue::Reload));
        } else {
            self.state = WeaponState::Idle;
            out.push(WeaponEffect::Cue(WeaponCue::ReloadStop));
        }
    }

    fn reload_duration(&self) -> Millis {
        if self.spec.reload_duration.is_zero() {
            GameConfig::FALLBACK_RELOAD_DURATION
        } else {
            self.spec.reload_duration
        }
    }

    fn equip_duration(&self) -> Millis {
        if self.spec.equip_duration.is_zero() {
            GameConfig::FALLBACK_EQUIP_DURATION
        } else {
            self.spec.equip_duration
        }
    }

    fn determine_state(&mut self, ctx: &WeaponContext, out: &mut Vec<WeaponEffect>) {
        let next = if self.equipped {
            if self.pending_reload {
                if self.can_reload(ctx) {
                    WeaponState::Reloading
                } else {
                    self.state
                }
            } else if self.wants_to_fire && self.can_fire(ctx) {
                WeaponState::Firing
            } else {
                WeaponState::Idle
            }
        } else if self.pending_equip {
            WeaponState::Equipping
        } else {
            WeaponState::Idle
        };
        self.set_state(next, ctx, out);
    }

    fn set_state(&mut self, next: WeaponState, ctx: &WeaponContext, out: &mut Vec<WeaponEffect>) {
        let previous = self.state;
        if previous == next {
            return;
        }
        trace!(
            target: "core::weapon",
            weapon = %self.entity,
            from = %previous,
            to = %next,
            "state change"
        );

        if previous == WeaponState::Firing {
            self.finish_burst(out);
        }
        self.state = next;
        if next == WeaponState::Firing {
            self.start_burst(ctx, out);
        }
    }

    fn start_burst(&mut self, ctx: &WeaponContext, out: &mut Vec<WeaponEffect>) {
        let interval = self.spec.time_between_shots;
        if let Some(last) = self.last_fire
            && !interval.is_zero()
            && last + interval > ctx.now
        {
            out.push(WeaponEffect::Schedule {
                purpose: TimerPurpose::Refire,
                delay: (last + interval) - ctx.now,
            });
        } else {
            self.handle_firing(ctx, out);
        }
    }

    fn finish_burst(&mut self, out: &mut Vec<WeaponEffect>) {
        self.burst_counter = 0;
        self.refiring = false;
        out.push(WeaponEffect::Cue(WeaponCue::FireStop));
        out.push(WeaponEffect::Cancel(TimerPurpose::Refire));
    }

    fn handle_firing(&mut self, ctx: &WeaponContext, out: &mut Vec<WeaponEffect>) {
        if self.can_fire(ctx) {
            if ctx.local {
                out.push(WeaponEffect::Shot {
                    authoritative: ctx.authority,
                });
                self.ammo_in_magazine -= 1;
                self.burst_counter += 1;
                if !ctx.authority {
                    out.push(WeaponEffect::Forward(WeaponIntent::HandleFiring));
                }
            }
        } else if self.can_reload(ctx) {
            let _ = self.start_reload(ctx, out);
        } else if ctx.local {
            if ctx.reserve == 0 && !self.refiring {
                out.push(WeaponEffect::Cue(WeaponCue::OutOfAmmo));
                out.push(WeaponEffect::Notify(Rejection::NotReady(
                    NotReadyReason::OutOfAmmo,
                )));
            }
            if self.burst_counter > 0 {
                self.finish_burst(out);
            }
        }

        if ctx.local {
            if self.ammo_in_magazine == 0 && self.can_reload(ctx) {
                let _ = self.start_reload(ctx, out);
            }
            self.refiring =
                self.state == WeaponState::Firing && !self.spec.time_between_shots.is_zero();
            if self.refiring {
                out.push(WeaponEffect::Schedule {
                    purpose: TimerPurpose::Refire,
                    delay: self.spec.time_between_shots,
                });
            }
        }
        self.last_fire = Some(ctx.now);
    }
}

#[cfg(test)]
mod tests;
