use crate::types::Millis;

/// Game configuration constants and tunable parameters.
///
/// Every field has a default, so configuration files only need to list the values
/// they override.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// Slot capacity for inventories created without an explicit size.
    pub default_inventory_capacity: usize,
    pub default_weight_capacity: f32,

    pub character_inventory_capacity: usize,
    pub character_weight_capacity: f32,

    pub container_inventory_capacity: usize,
    pub container_weight_capacity: f32,

    pub max_health: f32,

    /// Length of the forward probe used to find interactables.
    pub interaction_check_distance: f32,
    /// Minimum time between two focus probes. Zero probes on every tick.
    pub interaction_check_frequency: Millis,

    pub pickup_interaction_time: Millis,
    pub pickup_interaction_distance: f32,
    pub container_interaction_time: Millis,
    pub container_interaction_distance: f32,

    /// How long a corpse stays in the world after death.
    pub dead_body_lifespan: Millis,
    /// Lifespan granted to a corpse each time someone starts looting it.
    pub loot_grace_period: Millis,

    /// Distance in front of a character where dropped items land.
    pub drop_distance: f32,

    /// How much earlier than the reload animation the magazine is refilled.
    pub reload_transfer_lead: Millis,
    /// Floor for the ammo transfer delay.
    pub min_reload_transfer: Millis,
    /// How far ahead of the fire rate a reported shot may arrive and still be
    /// confirmed.
    pub shot_tolerance: Millis,
}

impl GameConfig {
    // ===== compile-time constants =====
    /// Items lighter than this bypass the inventory weight check.
    pub const WEIGHT_EPSILON: f32 = 1.0e-4;
    /// Health at or below this is treated as zero.
    pub const HEALTH_EPSILON: f32 = 1.0e-4;
    /// Reload duration used when a weapon does not define one.
    pub const FALLBACK_RELOAD_DURATION: Millis = Millis(500);
    /// Equip duration used when a weapon does not define one.
    pub const FALLBACK_EQUIP_DURATION: Millis = Millis(500);

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_INVENTORY_CAPACITY: usize = 10;
    pub const DEFAULT_WEIGHT_CAPACITY: f32 = 30.0;
    pub const CHARACTER_INVENTORY_CAPACITY: usize = 20;
    pub const CHARACTER_WEIGHT_CAPACITY: f32 = 50.0;
    pub const CONTAINER_INVENTORY_CAPACITY: usize = 25;
    pub const CONTAINER_WEIGHT_CAPACITY: f32 = 150.0;
    pub const MAX_HEALTH: f32 = 100.0;
    pub const INTERACTION_CHECK_DISTANCE: f32 = 1000.0;
    pub const INTERACTION_DISTANCE: f32 = 200.0;
    pub const PICKUP_INTERACTION_TIME: Millis = Millis(500);
    pub const DEAD_BODY_LIFESPAN: Millis = Millis::from_secs(120);
    pub const DROP_DISTANCE: f32 = 100.0;
    pub const RELOAD_TRANSFER_LEAD: Millis = Millis(100);
    pub const SHOT_TOLERANCE: Millis = Millis(100);

    pub fn new() -> Self {
        Self {
            default_inventory_capacity: Self::DEFAULT_INVENTORY_CAPACITY,
            default_weight_capacity: Self::DEFAULT_WEIGHT_CAPACITY,
            character_inventory_capacity: Self::CHARACTER_INVENTORY_CAPACITY,
            character_weight_capacity: Self::CHARACTER_WEIGHT_CAPACITY,
            container_inventory_capacity: Self::CONTAINER_INVENTORY_CAPACITY,
            container_weight_capacity: Self::CONTAINER_WEIGHT_CAPACITY,
            max_health: Self::MAX_HEALTH,
            interaction_check_distance: Self::INTERACTION_CHECK_DISTANCE,
            interaction_check_frequency: Millis::ZERO,
            pickup_interaction_time: Self::PICKUP_INTERACTION_TIME,
            pickup_interaction_distance: Self::INTERACTION_DISTANCE,
            container_interaction_time: Millis::ZERO,
            container_interaction_distance: Self::INTERACTION_DISTANCE,
            dead_body_lifespan: Self::DEAD_BODY_LIFESPAN,
            loot_grace_period: Self::DEAD_BODY_LIFESPAN,
            drop_distance: Self::DROP_DISTANCE,
            reload_transfer_lead: Self::RELOAD_TRANSFER_LEAD,
            min_reload_transfer: Self::RELOAD_TRANSFER_LEAD,
            shot_tolerance: Self::SHOT_TOLERANCE,
        }
    }

    pub fn with_interaction_check_frequency(mut self, frequency: Millis) -> Self {
        self.interaction_check_frequency = frequency;
        self
    }

    pub fn with_character_inventory(mut self, capacity: usize, weight_capacity: f32) -> Self {
        self.character_inventory_capacity = capacity;
        self.character_weight_capacity = weight_capacity;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
