use glam::Vec3;

use super::ItemFields;
use crate::interaction::Interactable;
use crate::item::{Item, ItemKind};
use crate::types::{EntityId, ItemId, Transform};
use crate::weapon::WeaponSnapshot;

/// Requests an observer forwards to the authority on behalf of its player.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Intent {
    StartFire,
    StopFire,
    /// One locally predicted shot along `aim`.
    HandleFiring { aim: Vec3 },
    StartReload,
    BeginInteract,
    StopInteract,
    SetLootSource { source: Option<EntityId> },
    LootItem { kind: ItemKind, quantity: u32 },
    UseItem { item: ItemId },
    DropItem { item: ItemId, quantity: u32 },
    UseThrowable,
    /// Latest view point of the player, used for authority-side probes.
    UpdateView { view: Transform },
}

impl Intent {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StartFire => "start_fire",
            Self::StopFire => "stop_fire",
            Self::HandleFiring { .. } => "handle_firing",
            Self::StartReload => "start_reload",
            Self::BeginInteract => "begin_interact",
            Self::StopInteract => "stop_interact",
            Self::SetLootSource { .. } => "set_loot_source",
            Self::LootItem { .. } => "loot_item",
            Self::UseItem { .. } => "use_item",
            Self::DropItem { .. } => "drop_item",
            Self::UseThrowable => "use_throwable",
            Self::UpdateView { .. } => "update_view",
        }
    }
}

/// An intent together with the character it acts for.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntentEnvelope {
    pub actor: EntityId,
    pub intent: Intent,
}

/// Creation data for an entity an observer has not seen yet.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntitySnapshot {
    Character {
        id: EntityId,
        name: String,
        view: Transform,
        max_health: f32,
    },
    Container {
        id: EntityId,
        name: String,
        transform: Transform,
        capacity: usize,
        weight_capacity: f32,
        interactable: Interactable,
    },
    Pickup {
        id: EntityId,
        transform: Transform,
        item: Item,
        interactable: Interactable,
    },
}

impl EntitySnapshot {
    pub fn id(&self) -> EntityId {
        match self {
            Self::Character { id, .. } | Self::Container { id, .. } | Self::Pickup { id, .. } => {
                *id
            }
        }
    }
}

/// One-way authoritative state pushed to an observer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateSync {
    Spawned(EntitySnapshot),
    Destroyed { entity: EntityId },
    /// Full item list; sent when the inventory's item set changed.
    InventoryItems {
        owner: EntityId,
        items_key: u32,
        capacity: usize,
        weight_capacity: f32,
        items: Vec<Item>,
    },
    /// Field changes of one item that stayed in its inventory.
    ItemPatch {
        owner: EntityId,
        item: ItemId,
        rep_key: u32,
        fields: ItemFields,
        quantity: u32,
        equipped: bool,
    },
    WeaponEquipped {
        owner: EntityId,
        weapon: Option<WeaponSnapshot>,
    },
    MagazineAmmo { owner: EntityId, ammo: u32 },
    BurstCounter { owner: EntityId, counter: u32 },
    PendingReload { owner: EntityId, pending: bool },
    Health { entity: EntityId, health: f32 },
    Killer {
        entity: EntityId,
        killer: Option<EntityId>,
    },
    LootSource {
        looter: EntityId,
        source: Option<EntityId>,
    },
    /// Activation of an entity's interactable (a corpse becoming lootable).
    Interactable { entity: EntityId, active: bool },
    View { entity: EntityId, view: Transform },
    PickupItem { pickup: EntityId, item: Item },
}

impl StateSync {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Spawned(_) => "spawned",
            Self::Destroyed { .. } => "destroyed",
            Self::InventoryItems { .. } => "inventory_items",
            Self::ItemPatch { .. } => "item_patch",
            Self::WeaponEquipped { .. } => "weapon_equipped",
            Self::MagazineAmmo { .. } => "magazine_ammo",
            Self::BurstCounter { .. } => "burst_counter",
            Self::PendingReload { .. } => "pending_reload",
            Self::Health { .. } => "health",
            Self::Killer { .. } => "killer",
            Self::LootSource { .. } => "loot_source",
            Self::Interactable { .. } => "interactable",
            Self::View { .. } => "view",
            Self::PickupItem { .. } => "pickup_item",
        }
    }
}
