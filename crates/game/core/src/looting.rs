//! Looting sessions: one actor drawing items from another entity's inventory.
//!
//! The session is a non-owning reference. The source inventory stays owned by
//! its entity, and every transfer runs on the authority through the world.
use crate::error::{Rejection, TargetIssue};
use crate::inventory::Inventory;
use crate::item::ItemKind;
use crate::types::EntityId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LootingSession {
    source: Option<EntityId>,
}

impl LootingSession {
    pub fn source(&self) -> Option<EntityId> {
        self.source
    }

    pub fn is_looting(&self) -> bool {
        self.source.is_some()
    }

    /// Returns true if the source actually changed.
    pub(crate) fn set_source(&mut self, source: Option<EntityId>) -> bool {
        std::mem::replace(&mut self.source, source) != source
    }

    /// Ends the session if it points at `destroyed`.
    pub(crate) fn source_destroyed(&mut self, destroyed: EntityId) -> bool {
        if self.source == Some(destroyed) {
            self.source = None;
            return true;
        }
        false
    }
}

/// How many units of `kind` a loot request may move out of `source`.
///
/// The request is capped at what the source holds; a source without any of the
/// kind rejects the request. Asking for zero is allowed and moves nothing.
pub fn lootable_quantity(
    source: &Inventory,
    kind: ItemKind,
    requested: u32,
) -> Result<u32, Rejection> {
    if requested == 0 {
        return Ok(0);
    }
    let held = source.total_quantity(kind);
    let quantity = requested.min(held);
    if quantity == 0 {
        return Err(Rejection::InvalidTarget(TargetIssue::ItemMissing));
    }
    Ok(quantity)
}
