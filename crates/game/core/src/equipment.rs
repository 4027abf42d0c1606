//! Equipment slots.
//!
//! Equipping never moves an item out of its inventory: the slot map only holds
//! the id of an item that stays in the owner's store with its equipped flag set.
use std::collections::BTreeMap;

use crate::signal::Signal;
use crate::types::ItemId;

/// Body slot an equippable item occupies.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EquipSlot {
    Head,
    Helmet,
    Torso,
    Vest,
    Legs,
    Feet,
    Hands,
    Backpack,
    PrimaryWeapon,
    Throwable,
}

/// Raised whenever a slot's occupant changes; `item` is `None` on unequip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EquipmentChanged {
    pub slot: EquipSlot,
    pub item: Option<ItemId>,
}

#[derive(Clone, Debug, Default)]
pub struct Equipment {
    slots: BTreeMap<EquipSlot, ItemId>,
    events: Signal<EquipmentChanged>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupant(&self, slot: EquipSlot) -> Option<ItemId> {
        self.slots.get(&slot).copied()
    }

    pub fn slot_of(&self, item: ItemId) -> Option<EquipSlot> {
        self.slots
            .iter()
            .find_map(|(slot, occupant)| (*occupant == item).then_some(*slot))
    }

    pub fn iter(&self) -> impl Iterator<Item = (EquipSlot, ItemId)> + '_ {
        self.slots.iter().map(|(slot, item)| (*slot, *item))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn events_mut(&mut self) -> &mut Signal<EquipmentChanged> {
        &mut self.events
    }

    /// Puts `item` into `slot`, returning the item it displaced.
    ///
    /// A different occupant is unequipped first (with its own event), so a slot
    /// never holds two items. Re-equipping the current occupant changes nothing.
    pub fn equip(&mut self, slot: EquipSlot, item: ItemId) -> Option<ItemId> {
        let displaced = match self.occupant(slot) {
            Some(current) if current == item => return None,
            Some(current) => {
                self.unequip(slot, current);
                Some(current)
            }
            None => None,
        };

        self.slots.insert(slot, item);
        self.events.emit(&EquipmentChanged {
            slot,
            item: Some(item),
        });
        displaced
    }

    /// Empties `slot` only if `item` is its current occupant.
    ///
    /// Returns false (and changes nothing) for a stale or repeated unequip.
    pub fn unequip(&mut self, slot: EquipSlot, item: ItemId) -> bool {
        if self.occupant(slot) != Some(item) {
            return false;
        }
        self.slots.remove(&slot);
        self.events.emit(&EquipmentChanged { slot, item: None });
        true
    }

    /// Unequips every slot, returning what was worn.
    pub fn clear(&mut self) -> Vec<(EquipSlot, ItemId)> {
        let worn: Vec<_> = self.iter().collect();
        for (slot, item) in &worn {
            self.unequip(*slot, *item);
        }
        worn
    }
}
