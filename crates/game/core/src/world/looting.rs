//! Loot sessions and transfers between two inventories.
use tracing::{debug, info};

use super::World;
use crate::env::Env;
use crate::error::{Rejection, TargetIssue};
use crate::inventory::AddResult;
use crate::item::ItemKind;
use crate::looting::lootable_quantity;
use crate::replication::Intent;
use crate::timer::{TimerKey, TimerPurpose};
use crate::types::EntityId;

impl World {
    /// Opens (`Some`) or closes (`None`) a loot session for `looter`.
    ///
    /// A character source must be dead; its body is kept around for at least
    /// the loot grace period from now.
    pub fn set_loot_source(
        &mut self,
        looter: EntityId,
        source: Option<EntityId>,
        env: &Env<'_>,
    ) -> Result<(), Rejection> {
        self.ensure_controls(looter)?;
        self.require_character(looter)?;
        if !self.is_authority() {
            self.forward(looter, Intent::SetLootSource { source });
            return Ok(());
        }

        if let Some(source) = source {
            self.validate_loot_source(looter, source)?;
            if self.characters.contains_key(&source) {
                self.extend_body_lifespan(source);
            }
        }

        let Some(character) = self.characters.get_mut(&looter) else {
            return Err(Rejection::InvalidTarget(TargetIssue::Missing));
        };
        if character.set_loot_source(source) {
            info!(target: "core::world", %looter, source = ?source, "loot source changed");
            if let Some(source) = source {
                env.play(source, "loot.open");
            }
        }
        Ok(())
    }

    fn validate_loot_source(&self, looter: EntityId, source: EntityId) -> Result<(), Rejection> {
        if source == looter || self.inventory(source).is_none() {
            return Err(Rejection::InvalidTarget(TargetIssue::Missing));
        }
        if !self.require_character(looter)?.is_alive() {
            return Err(Rejection::InvalidTarget(TargetIssue::Dead));
        }
        if self.characters.get(&source).is_some_and(|c| c.is_alive()) {
            return Err(Rejection::InvalidTarget(TargetIssue::Unavailable));
        }
        Ok(())
    }

    fn extend_body_lifespan(&mut self, body: EntityId) {
        let grace = self.config.loot_grace_period;
        let remaining = self
            .timers
            .remaining(TimerKey::new(body, TimerPurpose::Despawn), self.now)
            .unwrap_or_default();
        if remaining < grace {
            self.schedule(body, TimerPurpose::Despawn, grace);
            debug!(target: "core::world", %body, %grace, "body lifespan extended");
        }
    }

    /// Moves up to `quantity` units of `kind` from the open loot source into
    /// the looter's inventory.
    ///
    /// The request is capped at the source's stock; only what the looter's
    /// inventory accepts leaves the source. Partial and failed grants are
    /// reported to the looter.
    pub fn loot_item(
        &mut self,
        looter: EntityId,
        kind: ItemKind,
        quantity: u32,
        env: &Env<'_>,
    ) -> Result<AddResult, Rejection> {
        self.ensure_controls(looter)?;
        let source = self
            .require_character(looter)?
            .loot_source()
            .ok_or(Rejection::InvalidTarget(TargetIssue::NoLootSession))?;
        if quantity == 0 {
            return Ok(AddResult::nothing());
        }
        if !self.is_authority() {
            self.forward(looter, Intent::LootItem { kind, quantity });
            return Ok(AddResult::forwarded(quantity));
        }

        let stock = self
            .inventory(source)
            .ok_or(Rejection::InvalidTarget(TargetIssue::Missing))?;
        let quantity = lootable_quantity(stock, kind, quantity)?;
        let mut template = stock
            .items()
            .iter()
            .find(|item| item.kind() == kind)
            .cloned()
            .ok_or(Rejection::InvalidTarget(TargetIssue::ItemMissing))?;
        template.set_quantity(i64::from(quantity));

        let result = self.give_item(looter, &template, env);
        if result.granted > 0
            && let Some(stock) = self.inventory_mut(source)
        {
            let taken = stock.consume_kind(kind, result.granted);
            debug_assert_eq!(taken, result.granted, "loot source lost stock mid-transfer");
        }
        if let Some(message) = result.message() {
            env.notify(looter, &message);
        }
        debug!(
            target: "core::inventory",
            %looter, %source, %kind, requested = quantity, granted = result.granted,
            "looted"
        );
        Ok(result)
    }
}
