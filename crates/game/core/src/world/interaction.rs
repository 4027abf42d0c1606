//! Focus polling and the begin/hold/commit cycle on interactables.
use tracing::debug;

use super::World;
use crate::env::Env;
use crate::error::{Rejection, TargetIssue};
use crate::interaction::{self, FocusCandidate, FocusChange, InteractKind};
use crate::replication::Intent;
use crate::timer::{TimerKey, TimerPurpose};
use crate::types::EntityId;

impl World {
    /// Probes along `actor`'s view and updates its focus.
    pub fn perform_interaction_check(&mut self, actor: EntityId, env: &Env<'_>) {
        let Some(character) = self.characters.get(&actor) else {
            return;
        };
        let view = character.view;
        let candidate = env
            .probe(
                view.location,
                view.forward,
                self.config.interaction_check_distance,
                Some(actor),
            )
            .and_then(|hit| {
                let target = self.interactable(hit.entity).filter(|i| i.is_active())?;
                Some(FocusCandidate {
                    target: hit.entity,
                    distance: hit.distance,
                    reach: target.interaction_distance,
                })
            });

        let Some(character) = self.characters.get_mut(&actor) else {
            return;
        };
        match character.interaction.resolve(candidate) {
            FocusChange::Unchanged => {}
            FocusChange::Focused { previous, target } => {
                if let Some(previous) = previous {
                    self.release(actor, previous);
                    if self.is_local(actor) {
                        env.play(previous, "interaction.unfocus");
                    }
                }
                self.cancel(actor, TimerPurpose::Interaction);
                if let Some(character) = self.characters.get_mut(&actor) {
                    character.interaction.set_held(false);
                }
                if self.is_local(actor) {
                    env.play(target, "interaction.focus");
                }
                debug!(target: "core::interaction", %actor, %target, "focused");
            }
            FocusChange::Lost {
                previous,
                was_interacting,
            } => {
                self.cancel(actor, TimerPurpose::Interaction);
                if was_interacting {
                    self.release(actor, previous);
                }
                if self.is_local(actor) {
                    env.play(previous, "interaction.unfocus");
                }
                debug!(target: "core::interaction", %actor, %previous, was_interacting, "focus lost");
            }
        }
    }

    /// Probes for every character due a focus check: the local player, and on
    /// the authority anyone with a hold countdown running.
    pub(super) fn poll_interactions(&mut self, env: &Env<'_>) {
        let frequency = self.config.interaction_check_frequency;
        let now = self.now;
        let authority = self.is_authority();
        let due: Vec<EntityId> = self
            .characters
            .iter()
            .filter(|(id, character)| {
                let interacting = self
                    .timers
                    .is_active(TimerKey::new(**id, TimerPurpose::Interaction));
                character.is_alive() && (self.is_local(**id) || (authority && interacting))
            })
            .map(|(id, _)| *id)
            .collect();

        for actor in due {
            let check = self
                .characters
                .get_mut(&actor)
                .is_some_and(|c| c.interaction.check_due(now, frequency));
            if check {
                self.perform_interaction_check(actor, env);
            }
        }
    }

    /// Interact key pressed.
    ///
    /// The authority re-probes so both sides agree on the target; observers
    /// forward the press. An instant target commits at once, a timed one arms
    /// the hold countdown.
    pub fn begin_interact(&mut self, actor: EntityId, env: &Env<'_>) -> Result<(), Rejection> {
        self.ensure_controls(actor)?;
        if !self.require_character(actor)?.is_alive() {
            return Err(Rejection::InvalidTarget(TargetIssue::Dead));
        }
        if self.is_authority() {
            self.perform_interaction_check(actor, env);
        } else {
            self.forward(actor, Intent::BeginInteract);
        }

        let Some(character) = self.characters.get_mut(&actor) else {
            return Err(Rejection::InvalidTarget(TargetIssue::Missing));
        };
        character.interaction.set_held(true);
        let Some(target) = character.interaction.focus() else {
            return Ok(());
        };

        let interactable = self
            .interactable_mut(target)
            .ok_or(Rejection::InvalidTarget(TargetIssue::Missing))?;
        interactable.begin_interact(actor)?;
        let (instant, hold) = (interactable.is_instant(), interactable.interaction_time);

        if instant {
            self.commit_interaction(actor, env);
        } else {
            self.schedule(actor, TimerPurpose::Interaction, hold);
        }
        Ok(())
    }

    /// Interact key released.
    pub fn stop_interact(&mut self, actor: EntityId, env: &Env<'_>) -> Result<(), Rejection> {
        self.ensure_controls(actor)?;
        self.require_character(actor)?;
        if !self.is_authority() {
            self.forward(actor, Intent::StopInteract);
        }
        if let Some(target) = self.stop_interact_local(actor)
            && self.is_local(actor)
        {
            env.play(target, "interaction.end");
        }
        Ok(())
    }

    /// Releases the key, cancels the countdown, and ends the interaction on
    /// the focused target. Returns that target.
    pub(super) fn stop_interact_local(&mut self, actor: EntityId) -> Option<EntityId> {
        self.cancel(actor, TimerPurpose::Interaction);
        let character = self.characters.get_mut(&actor)?;
        character.interaction.set_held(false);
        let target = character.interaction.focus()?;
        self.release(actor, target);
        Some(target)
    }

    pub(super) fn release(&mut self, actor: EntityId, target: EntityId) {
        if let Some(interactable) = self.interactable_mut(target) {
            interactable.end_interact(actor);
        }
    }

    /// Fraction of the running hold countdown, for UI polling.
    pub fn interaction_progress(&self, actor: EntityId) -> Option<f32> {
        let key = TimerKey::new(actor, TimerPurpose::Interaction);
        let remaining = self.timers.remaining(key, self.now)?;
        let total = self.timers.duration(key)?;
        Some(interaction::progress(remaining, total))
    }

    /// Commits the interaction with the focused target. Only the authority
    /// applies the outcome.
    pub(super) fn commit_interaction(&mut self, actor: EntityId, env: &Env<'_>) {
        self.cancel(actor, TimerPurpose::Interaction);
        let Some(target) = self
            .characters
            .get(&actor)
            .and_then(|c| c.interaction.focus())
        else {
            return;
        };
        let Some(kind) = self.interactable(target).map(|i| i.kind) else {
            return;
        };
        debug!(target: "core::interaction", %actor, %target, ?kind, "interaction committed");
        if !self.is_authority() {
            return;
        }

        match kind {
            InteractKind::Pickup => self.take_pickup(actor, target, env),
            InteractKind::Loot => {
                if let Err(rejection) = self.set_loot_source(actor, Some(target), env) {
                    debug!(target: "core::interaction", %actor, %target, %rejection, "loot refused");
                }
            }
        }
    }

    /// Moves a pickup's stack into the actor's inventory, shrinking the pickup
    /// on a partial grant and removing it once empty.
    fn take_pickup(&mut self, actor: EntityId, pickup: EntityId, env: &Env<'_>) {
        let Some(item) = self.pickups.get(&pickup).map(|p| p.item.clone()) else {
            return;
        };
        let result = self.give_item(actor, &item, env);
        if let Some(message) = result.message() {
            env.notify(actor, &message);
        }

        if result.granted >= item.quantity() {
            self.destroy_entity(pickup, env);
        } else if result.granted > 0
            && let Some(pickup) = self.pickups.get_mut(&pickup)
        {
            pickup
                .item
                .set_quantity(i64::from(item.quantity() - result.granted));
        }
    }
}
