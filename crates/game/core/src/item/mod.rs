//! Item definitions and owned item instances.
//!
//! An [`ItemDefinition`] is static catalog data; an [`Item`] is one owned stack
//! living in exactly one inventory. Inventories never share instances: adding
//! an item always mints a fresh copy owned by the receiving store.
mod catalog;

pub use catalog::{ItemCatalog, ItemTable};

use core::fmt;

use crate::config::GameConfig;
use crate::equipment::EquipSlot;
use crate::types::ItemId;
use crate::weapon::WeaponSpec;

/// Class tag shared by every instance of the same catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemKind(pub u32);

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind:{}", self.0)
    }
}

/// What an equippable item does while it occupies its slot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquipRole {
    /// Worn gear; only swaps the character's appearance.
    Gear,
    /// Spawns and binds a weapon entity while equipped.
    Weapon(WeaponSpec),
    /// Thrown one unit at a time.
    Throwable { damage: f32 },
}

/// Closed set of item behaviors.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemBehavior {
    /// Using it does nothing (ammo, materials).
    #[default]
    Generic,
    /// Heals the user and consumes one unit.
    Food { heal_amount: f32 },
    /// Toggles between equipped and unequipped.
    Equippable { slot: EquipSlot, role: EquipRole },
}

/// What using an item asks the world to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ItemUse {
    Nothing,
    Eat { heal_amount: f32 },
    ToggleEquip { slot: EquipSlot },
}

/// Static catalog entry for an item class.
///
/// Defaults mirror a plain stackable item: weightless, quantity 1, stacks of 2.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDefinition {
    pub kind: ItemKind,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weight: f32,
    #[cfg_attr(feature = "serde", serde(default = "default_max_stack"))]
    pub max_stack: u32,
    #[cfg_attr(feature = "serde", serde(default = "default_stackable"))]
    pub stackable: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_quantity"))]
    pub default_quantity: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub behavior: ItemBehavior,
}

#[cfg(feature = "serde")]
fn default_max_stack() -> u32 {
    ItemDefinition::DEFAULT_MAX_STACK
}

#[cfg(feature = "serde")]
fn default_stackable() -> bool {
    true
}

#[cfg(feature = "serde")]
fn default_quantity() -> u32 {
    1
}

impl ItemDefinition {
    pub const DEFAULT_MAX_STACK: u32 = 2;

    pub fn new(kind: ItemKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            weight: 0.0,
            max_stack: Self::DEFAULT_MAX_STACK,
            stackable: true,
            default_quantity: 1,
            behavior: ItemBehavior::Generic,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_max_stack(mut self, max_stack: u32) -> Self {
        self.max_stack = max_stack.max(1);
        self.stackable = true;
        self
    }

    pub fn with_default_quantity(mut self, quantity: u32) -> Self {
        self.default_quantity = quantity;
        self
    }

    pub fn non_stackable(mut self) -> Self {
        self.stackable = false;
        self
    }

    pub fn food(mut self, heal_amount: f32) -> Self {
        self.behavior = ItemBehavior::Food { heal_amount };
        self
    }

    /// Equippables never stack.
    pub fn equippable(mut self, slot: EquipSlot, role: EquipRole) -> Self {
        self.behavior = ItemBehavior::Equippable { slot, role };
        self.stackable = false;
        self
    }

    pub fn is_stackable(&self) -> bool {
        self.stackable && !matches!(self.behavior, ItemBehavior::Equippable { .. })
    }

    /// Mints an owned instance; the quantity is clamped to what one stack can hold.
    pub fn instantiate(&self, id: ItemId, quantity: u32) -> Item {
        let mut item = Item {
            id,
            kind: self.kind,
            name: self.name.clone(),
            weight: self.weight,
            max_stack: self.max_stack.max(1),
            stackable: self.is_stackable(),
            behavior: self.behavior.clone(),
            quantity: 0,
            equipped: false,
            rep_key: 0,
        };
        item.quantity = quantity.min(item.max_quantity());
        item
    }
}

/// One owned stack of an item class.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item {
    id: ItemId,
    kind: ItemKind,
    name: String,
    weight: f32,
    max_stack: u32,
    stackable: bool,
    behavior: ItemBehavior,
    quantity: u32,
    equipped: bool,
    /// Bumped on every replicated field change.
    rep_key: u32,
}

impl Item {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn max_stack(&self) -> u32 {
        self.max_stack
    }

    pub fn is_stackable(&self) -> bool {
        self.stackable
    }

    pub fn behavior(&self) -> &ItemBehavior {
        &self.behavior
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn is_equipped(&self) -> bool {
        self.equipped
    }

    pub fn rep_key(&self) -> u32 {
        self.rep_key
    }

    /// Largest quantity this stack may hold.
    pub fn max_quantity(&self) -> u32 {
        if self.stackable { self.max_stack } else { 1 }
    }

    pub fn stack_weight(&self) -> f32 {
        self.weight * self.quantity as f32
    }

    /// Weightless items are exempt from inventory weight limits.
    pub fn is_weightless(&self) -> bool {
        self.weight.abs() <= GameConfig::WEIGHT_EPSILON
    }

    pub fn equip_slot(&self) -> Option<EquipSlot> {
        match self.behavior {
            ItemBehavior::Equippable { slot, .. } => Some(slot),
            _ => None,
        }
    }

    pub fn weapon_spec(&self) -> Option<&WeaponSpec> {
        match &self.behavior {
            ItemBehavior::Equippable {
                role: EquipRole::Weapon(spec),
                ..
            } => Some(spec),
            _ => None,
        }
    }

    /// Sets the quantity, clamped to `[0, max_quantity]`.
    ///
    /// Accepts any signed input so callers can pass raw arithmetic results.
    /// Returns false when the clamped value equals the current one; the
    /// replication key only moves on real changes.
    pub fn set_quantity(&mut self, quantity: i64) -> bool {
        let clamped = quantity.clamp(0, i64::from(self.max_quantity())) as u32;
        if clamped == self.quantity {
            return false;
        }
        self.quantity = clamped;
        self.mark_dirty();
        true
    }

    pub(crate) fn set_equipped(&mut self, equipped: bool) -> bool {
        if self.equipped == equipped {
            return false;
        }
        self.equipped = equipped;
        self.mark_dirty();
        true
    }

    /// Resolves the `Use` capability of this item.
    pub fn use_action(&self) -> ItemUse {
        match &self.behavior {
            ItemBehavior::Generic => ItemUse::Nothing,
            ItemBehavior::Food { heal_amount } => ItemUse::Eat {
                heal_amount: *heal_amount,
            },
            ItemBehavior::Equippable { slot, .. } => ItemUse::ToggleEquip { slot: *slot },
        }
    }

    /// Moves this instance under a new id, as happens when a store adopts a copy.
    pub(crate) fn reassign(&mut self, id: ItemId) {
        self.id = id;
    }

    /// Overwrites replicated fields with values pushed by the authority.
    pub(crate) fn apply_remote(&mut self, rep_key: u32, quantity: u32, equipped: bool) {
        self.quantity = quantity.min(self.max_quantity());
        self.equipped = equipped;
        self.rep_key = rep_key;
    }

    fn mark_dirty(&mut self) {
        self.rep_key = self.rep_key.wrapping_add(1);
    }
}
