//! Gameplay rules for a networked survival shooter.
//!
//! `survival-core` is pure and synchronous: it owns items, inventories,
//! equipment, interactions, loot sessions, the weapon state machine, and the
//! replication messages exchanged between replicas. Engine concerns (ray
//! probes, presentation, spawning) come in through the narrow service traits in
//! [`env`], and time only moves when the host calls [`World::advance`].
//!
//! One [`World`] runs per replica. The authoritative world mutates shared state
//! directly; observer worlds predict, queue [`IntentEnvelope`]s, and converge
//! through [`World::apply_sync`].
pub mod character;
pub mod config;
pub mod env;
pub mod equipment;
pub mod error;
pub mod interaction;
pub mod inventory;
pub mod item;
pub mod looting;
pub mod replication;
pub mod signal;
pub mod timer;
pub mod types;
pub mod weapon;
pub mod world;

pub use character::{Character, CharacterEvent};
pub use config::GameConfig;
pub use env::{
    EffectSink, Env, NotificationSink, ProbeHit, SpatialProbe, SpawnError, SpawnKind, SpawnService,
};
pub use equipment::{EquipSlot, Equipment, EquipmentChanged};
pub use error::{
    CapacityLimit, ErrorSeverity, GameError, NotReadyReason, Rejection, TargetIssue,
};
pub use interaction::{InteractKind, Interactable, InteractionSession};
pub use inventory::{AddResult, AddStatus, Inventory, InventoryEvent};
pub use item::{
    EquipRole, Item, ItemBehavior, ItemCatalog, ItemDefinition, ItemKind, ItemTable, ItemUse,
};
pub use looting::LootingSession;
pub use replication::{
    EntitySnapshot, FieldTag, Intent, IntentEnvelope, ItemFields, NetRole, ReplicationChannel,
    StateSync,
};
pub use signal::{Signal, SubscriptionId};
pub use timer::{TimerKey, TimerPurpose, TimerQueue};
pub use types::{EntityId, ItemId, Millis, Transform};
pub use weapon::{Weapon, WeaponSnapshot, WeaponSpec, WeaponState};
pub use world::{LootContainer, Pickup, World, WorldSnapshot};
