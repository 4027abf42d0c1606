//! Weapon verbs, effect application, and hit resolution.
use glam::Vec3;
use tracing::{debug, info, warn};

use super::World;
use crate::env::{Env, SpawnKind};
use crate::equipment::EquipSlot;
use crate::error::{NotReadyReason, Rejection, TargetIssue};
use crate::item::{EquipRole, ItemBehavior};
use crate::replication::Intent;
use crate::timer::TimerPurpose;
use crate::types::{EntityId, ItemId, Transform};
use crate::weapon::{
    Weapon, WeaponContext, WeaponCue, WeaponEffect, WeaponIntent, WeaponSnapshot, WeaponSpec,
};

const NO_WEAPON: Rejection = Rejection::NotReady(NotReadyReason::NoWeapon);

impl World {
    fn weapon_context(&self, owner: EntityId) -> Option<WeaponContext> {
        let character = self.characters.get(&owner)?;
        let weapon = character.weapon.as_ref()?;
        Some(WeaponContext {
            now: self.now,
            authority: self.is_authority(),
            local: self.is_local(owner),
            owner_alive: character.is_alive(),
            reserve: character.reserve_ammo(weapon.spec().ammo_kind),
            transfer_lead: self.config.reload_transfer_lead,
            min_transfer: self.config.min_reload_transfer,
            shot_tolerance: self.config.shot_tolerance,
        })
    }

    /// Runs one transition on `owner`'s weapon and applies what it produced.
    pub(super) fn with_weapon<R>(
        &mut self,
        owner: EntityId,
        aim: Option<Vec3>,
        env: &Env<'_>,
        transition: impl FnOnce(&mut Weapon, &WeaponContext, &mut Vec<WeaponEffect>) -> R,
    ) -> Option<R> {
        let ctx = self.weapon_context(owner)?;
        let weapon = self.characters.get_mut(&owner)?.weapon.as_mut()?;
        let mut effects = Vec::new();
        let result = transition(weapon, &ctx, &mut effects);
        self.apply_weapon_effects(owner, &effects, aim, env);
        Some(result)
    }

    pub fn start_fire(&mut self, actor: EntityId, env: &Env<'_>) -> Result<(), Rejection> {
        self.ensure_controls(actor)?;
        self.with_weapon(actor, None, env, |w, ctx, out| w.start_fire(ctx, out))
            .unwrap_or(Err(NO_WEAPON))
    }

    pub fn stop_fire(&mut self, actor: EntityId, env: &Env<'_>) -> Result<(), Rejection> {
        self.ensure_controls(actor)?;
        self.with_weapon(actor, None, env, |w, ctx, out| w.stop_fire(ctx, out))
            .ok_or(NO_WEAPON)
    }

    pub fn start_reload(&mut self, actor: EntityId, env: &Env<'_>) -> Result<(), Rejection> {
        self.ensure_controls(actor)?;
        self.with_weapon(actor, None, env, |w, ctx, out| w.start_reload(ctx, out))
            .unwrap_or(Err(NO_WEAPON))
    }

    /// Authority side of a shot the owning client reported along `aim`.
    pub(crate) fn confirm_shot(
        &mut self,
        actor: EntityId,
        aim: Vec3,
        env: &Env<'_>,
    ) -> Result<(), Rejection> {
        self.with_weapon(actor, Some(aim), env, |w, ctx, out| {
            w.confirm_shot(ctx, out)
        })
        .unwrap_or(Err(NO_WEAPON))
    }

    pub(super) fn weapon_timer(&mut self, owner: EntityId, purpose: TimerPurpose, env: &Env<'_>) {
        let fired = self.with_weapon(owner, None, env, |w, ctx, out| match purpose {
            TimerPurpose::ReloadFinish => w.finish_reload(ctx, out),
            TimerPurpose::ReloadTransfer => {
                w.transfer_ammo(ctx, out);
            }
            TimerPurpose::Refire => w.refire(ctx, out),
            TimerPurpose::EquipFinish => w.finish_equip(ctx, out),
            TimerPurpose::Interaction | TimerPurpose::Despawn => {}
        });
        if fired.is_none() {
            debug!(target: "core::weapon", %owner, %purpose, "timer fired without a weapon");
        }
    }

    fn apply_weapon_effects(
        &mut self,
        owner: EntityId,
        effects: &[WeaponEffect],
        aim: Option<Vec3>,
        env: &Env<'_>,
    ) {
        let Some(weapon_entity) = self
            .characters
            .get(&owner)
            .and_then(|c| c.weapon.as_ref())
            .map(Weapon::entity)
        else {
            return;
        };
        let local = self.is_local(owner);

        for effect in effects {
            match *effect {
                WeaponEffect::Cue(cue) => env.play(weapon_entity, cue.as_str()),
                WeaponEffect::Shot { authoritative } => {
                    if local {
                        env.play(weapon_entity, WeaponCue::Fire.as_str());
                    }
                    if authoritative {
                        self.resolve_hit(owner, aim, env);
                    } else {
                        self.predict_impact(owner, env);
                    }
                }
                WeaponEffect::Schedule { purpose, delay } => self.schedule(owner, purpose, delay),
                WeaponEffect::Cancel(purpose) => {
                    self.cancel(owner, purpose);
                }
                WeaponEffect::Notify(rejection) => {
                    if local {
                        env.notify(owner, &rejection.to_string());
                    }
                }
                WeaponEffect::Forward(intent) => {
                    let intent = match intent {
                        WeaponIntent::StartFire => Intent::StartFire,
                        WeaponIntent::StopFire => Intent::StopFire,
                        WeaponIntent::StartReload => Intent::StartReload,
                        WeaponIntent::HandleFiring => Intent::HandleFiring {
                            aim: self.characters.get(&owner).map_or(Vec3::X, |c| c.view.forward),
                        },
                    };
                    self.forward(owner, intent);
                }
                WeaponEffect::TransferAmmo(rounds) => self.draw_reserve(owner, rounds),
                WeaponEffect::ReturnAmmo(rounds) => self.return_reserve(owner, rounds, env),
            }
        }
    }

    /// Pulls reloaded rounds out of the owner's reserve stacks.
    fn draw_reserve(&mut self, owner: EntityId, rounds: u32) {
        let Some(character) = self.characters.get_mut(&owner) else {
            return;
        };
        let Some(kind) = character.weapon.as_ref().map(|w| w.spec().ammo_kind) else {
            return;
        };
        let taken = character.inventory.consume_kind(kind, rounds);
        debug_assert_eq!(taken, rounds, "reserve shrank during reload");
        debug!(target: "core::weapon", %owner, rounds = taken, "magazine refilled from reserve");
    }

    /// Puts unfired rounds back into the owner's inventory.
    ///
    /// Rounds the inventory cannot take are dropped at the owner's feet so no
    /// ammo disappears.
    fn return_reserve(&mut self, owner: EntityId, rounds: u32, env: &Env<'_>) {
        let Some(character) = self.characters.get(&owner) else {
            return;
        };
        let Some(kind) = character.weapon.as_ref().map(|w| w.spec().ammo_kind) else {
            return;
        };
        let view = character.view;
        let Some(definition) = self.catalog.definition(kind).cloned() else {
            warn!(target: "core::weapon", %owner, %kind, rounds, "returned ammo has no catalog entry");
            return;
        };

        let granted = self
            .characters
            .get_mut(&owner)
            .map_or(0, |c| c.inventory.try_add_definition(&definition, rounds).granted);

        let mut leftover = rounds - granted;
        while leftover > 0 {
            let item = definition.instantiate(ItemId::new(owner, u32::MAX), leftover);
            let dropped = item.quantity();
            if dropped == 0 {
                break;
            }
            let at = Transform::new(view.location, view.forward);
            if let Err(error) = self.spawn_pickup(item, at, env) {
                warn!(target: "core::weapon", %owner, rounds = leftover, %error, "could not drop returned ammo");
                break;
            }
            leftover -= dropped;
        }
    }

    /// Authority hit resolution: re-traces from the shooter's recorded view
    /// along the reported aim and applies weapon damage.
    fn resolve_hit(&mut self, owner: EntityId, aim: Option<Vec3>, env: &Env<'_>) {
        let Some(shooter) = self.characters.get(&owner) else {
            return;
        };
        let Some(weapon) = shooter.weapon.as_ref() else {
            return;
        };
        let direction = aim.unwrap_or(shooter.view.forward).normalize_or_zero();
        if direction == Vec3::ZERO {
            return;
        }
        let origin = shooter.view.location;
        let (range, damage) = (weapon.spec().range, weapon.spec().damage);

        let Some(hit) = env.probe(origin, direction, range, Some(owner)) else {
            return;
        };
        env.play(hit.entity, "weapon.impact");
        if self.characters.contains_key(&hit.entity) {
            self.take_damage(hit.entity, damage, owner, env);
        }
    }

    /// Owning-client probe for immediate impact feedback. Never deals damage.
    fn predict_impact(&self, owner: EntityId, env: &Env<'_>) {
        let Some(shooter) = self.characters.get(&owner) else {
            return;
        };
        let Some(range) = shooter.weapon.as_ref().map(|w| w.spec().range) else {
            return;
        };
        let view = shooter.view;
        if let Some(hit) = env.probe(view.location, view.forward, range, Some(owner)) {
            env.play(hit.entity, "weapon.impact");
        }
    }

    /// Applies `amount` damage from `instigator`. Authority only.
    ///
    /// Returns the health actually removed.
    pub fn take_damage(
        &mut self,
        target: EntityId,
        amount: f32,
        instigator: EntityId,
        env: &Env<'_>,
    ) -> f32 {
        if !self.is_authority() {
            return 0.0;
        }
        let Some(character) = self.characters.get_mut(&target) else {
            return 0.0;
        };
        if !character.is_alive() {
            return 0.0;
        }
        let removed = -character.modify_health(-amount.max(0.0));
        debug!(target: "core::world", %target, %instigator, removed, health = character.health(), "damage");
        if !character.is_alive() {
            self.kill(target, instigator, env);
        }
        removed
    }

    /// Death on the authority: record the killer, stop firing, drop every
    /// session, unequip everything, expose the body, and start its lifespan.
    pub(crate) fn kill(&mut self, target: EntityId, killer: EntityId, env: &Env<'_>) {
        let Some(character) = self.characters.get_mut(&target) else {
            return;
        };
        if !character.mark_killed(killer) {
            return;
        }
        info!(target: "core::world", victim = %target, %killer, "character died");

        self.with_weapon(target, None, env, |w, ctx, out| w.stop_fire(ctx, out));
        self.stop_interact_local(target);
        if let Some(character) = self.characters.get_mut(&target) {
            character.interaction.clear();
            character.set_loot_source(None);
        }

        let equipped: Vec<(EquipSlot, ItemId)> = self
            .characters
            .get(&target)
            .map(|c| c.equipment.iter().collect())
            .unwrap_or_default();
        for (slot, item) in equipped {
            self.unequip_item(target, slot, item, env);
        }

        let lifespan = self.config.dead_body_lifespan;
        self.schedule(target, TimerPurpose::Despawn, lifespan);
    }

    /// Spawns and binds the weapon entity for `item`. Authority only.
    pub(super) fn equip_weapon(
        &mut self,
        owner: EntityId,
        item: ItemId,
        spec: WeaponSpec,
        env: &Env<'_>,
    ) -> Result<(), Rejection> {
        let view = self.require_character(owner)?.view;
        if self.characters.get(&owner).is_some_and(|c| c.weapon.is_some()) {
            self.unequip_weapon(owner, env);
        }
        let entity = env.spawn(SpawnKind::Weapon, view).map_err(|error| {
            warn!(target: "core::weapon", %owner, %error, "weapon spawn failed");
            Rejection::InvalidTarget(TargetIssue::Unavailable)
        })?;

        if let Some(character) = self.characters.get_mut(&owner) {
            character.set_weapon(Some(Weapon::new(entity, owner, item, spec)));
        }
        self.with_weapon(owner, None, env, |w, ctx, out| w.equip(ctx, out));
        debug!(target: "core::weapon", %owner, weapon = %entity, "weapon equipped");
        Ok(())
    }

    /// Observer side of a replicated weapon change: swaps the local weapon to
    /// match the authority's.
    pub(super) fn apply_remote_weapon(
        &mut self,
        owner: EntityId,
        snapshot: Option<&WeaponSnapshot>,
        env: &Env<'_>,
    ) {
        let current = self
            .characters
            .get(&owner)
            .and_then(|c| c.weapon.as_ref())
            .map(Weapon::entity);
        if current == snapshot.map(|s| s.entity) {
            return;
        }
        if current.is_some() {
            self.unequip_weapon(owner, env);
        }
        let Some(snapshot) = snapshot else {
            return;
        };
        let Some(character) = self.characters.get_mut(&owner) else {
            return;
        };
        character.set_weapon(Some(Weapon::from_snapshot(owner, snapshot)));
        self.with_weapon(owner, None, env, |w, ctx, out| w.equip(ctx, out));
        debug!(target: "core::weapon", %owner, weapon = %snapshot.entity, "replicated weapon equipped");
    }

    /// Detaches and removes the owner's weapon, returning its magazine.
    pub(super) fn unequip_weapon(&mut self, owner: EntityId, env: &Env<'_>) -> bool {
        if self
            .with_weapon(owner, None, env, |w, ctx, out| w.unequip(ctx, out))
            .is_none()
        {
            return false;
        }
        let Some(character) = self.characters.get_mut(&owner) else {
            return false;
        };
        let Some(weapon) = character.weapon.take() else {
            return false;
        };
        character.set_weapon(None);
        if self.is_authority() {
            env.destroy(weapon.entity());
        }
        debug!(target: "core::weapon", %owner, weapon = %weapon.entity(), "weapon unequipped");
        true
    }

    /// Throws the equipped throwable: spawns the projectile and consumes one unit.
    pub fn use_throwable(&mut self, actor: EntityId, env: &Env<'_>) -> Result<(), Rejection> {
        self.ensure_controls(actor)?;
        let character = self.require_character(actor)?;
        let throwable = character
            .equipment
            .occupant(EquipSlot::Throwable)
            .and_then(|id| character.inventory.get(id))
            .filter(|item| {
                matches!(
                    item.behavior(),
                    ItemBehavior::Equippable {
                        role: EquipRole::Throwable { .. },
                        ..
                    }
                )
            })
            .map(|item| (item.id(), item.quantity()));
        let Some((item, quantity)) = throwable else {
            let rejection = Rejection::NotReady(NotReadyReason::NoThrowable);
            env.notify(actor, &rejection.to_string());
            return Err(rejection);
        };
        let view = character.view;

        if !self.is_authority() {
            // The last unit leaves the slot right away so the UI does not show it.
            if quantity <= 1
                && let Some(character) = self.characters.get_mut(&actor)
            {
                character.equipment.unequip(EquipSlot::Throwable, item);
            }
            env.play(actor, "throwable.toss");
            self.forward(actor, Intent::UseThrowable);
            return Ok(());
        }

        let at = Transform::new(view.ahead(20.0), view.forward);
        env.spawn(SpawnKind::Projectile, at).map_err(|error| {
            warn!(target: "core::weapon", %actor, %error, "projectile spawn failed");
            Rejection::InvalidTarget(TargetIssue::Unavailable)
        })?;
        env.play(actor, "throwable.toss");

        if quantity <= 1 {
            self.unequip_item(actor, EquipSlot::Throwable, item, env);
        }
        if let Some(character) = self.characters.get_mut(&actor) {
            character.inventory.consume(item, 1);
        }
        Ok(())
    }
}
