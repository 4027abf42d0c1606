//! Per-player composition of every gameplay component.
//!
//! A [`Character`] owns its inventory, equipment, weapon and sessions; the
//! [`World`](crate::world::World) drives the cross-entity parts (timers,
//! probes, other entities' inventories).
use tracing::debug;

use crate::config::GameConfig;
use crate::equipment::Equipment;
use crate::interaction::{InteractKind, Interactable, InteractionSession};
use crate::inventory::Inventory;
use crate::item::ItemKind;
use crate::looting::LootingSession;
use crate::signal::Signal;
use crate::types::{EntityId, Transform};
use crate::weapon::Weapon;

/// Observer-facing notifications raised by a character.
#[derive(Clone, Debug, PartialEq)]
pub enum CharacterEvent {
    /// Open (`Some`) or close (`None`) the loot menu.
    LootMenu { source: Option<EntityId> },
    HealthChanged { health: f32, delta: f32 },
    Died { killer: EntityId },
    WeaponChanged { weapon: Option<EntityId> },
}

#[derive(Debug)]
pub struct Character {
    id: EntityId,
    name: String,
    pub(crate) view: Transform,
    pub(crate) inventory: Inventory,
    pub(crate) equipment: Equipment,
    pub(crate) weapon: Option<Weapon>,
    pub(crate) interaction: InteractionSession,
    pub(crate) looting: LootingSession,
    health: f32,
    max_health: f32,
    killer: Option<EntityId>,
    pub(crate) corpse: Interactable,
    events: Signal<CharacterEvent>,
}

impl Character {
    pub fn new(id: EntityId, name: impl Into<String>, view: Transform, config: &GameConfig) -> Self {
        let name = name.into();
        let corpse = Interactable::new(InteractKind::Loot, name.clone(), "Loot")
            .with_time(config.container_interaction_time)
            .with_distance(config.container_interaction_distance)
            .inactive();
        Self {
            id,
            name,
            view,
            inventory: Inventory::new(
                id,
                config.character_inventory_capacity,
                config.character_weight_capacity,
            ),
            equipment: Equipment::new(),
            weapon: None,
            interaction: InteractionSession::new(),
            looting: LootingSession::default(),
            health: config.max_health,
            max_health: config.max_health,
            killer: None,
            corpse,
            events: Signal::new(),
        }
    }

    /// Overrides the configured maximum and refills health to it.
    pub fn with_max_health(mut self, max_health: f32) -> Self {
        self.max_health = max_health.max(0.0);
        self.health = self.max_health;
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn view(&self) -> Transform {
        self.view
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    pub fn equipment(&self) -> &Equipment {
        &self.equipment
    }

    pub fn equipment_mut(&mut self) -> &mut Equipment {
        &mut self.equipment
    }

    pub fn weapon(&self) -> Option<&Weapon> {
        self.weapon.as_ref()
    }

    pub fn interaction(&self) -> &InteractionSession {
        &self.interaction
    }

    pub fn looting(&self) -> &LootingSession {
        &self.looting
    }

    pub fn loot_source(&self) -> Option<EntityId> {
        self.looting.source()
    }

    pub fn is_looting(&self) -> bool {
        self.looting.is_looting()
    }

    pub fn corpse(&self) -> &Interactable {
        &self.corpse
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn killer(&self) -> Option<EntityId> {
        self.killer
    }

    pub fn events_mut(&mut self) -> &mut Signal<CharacterEvent> {
        &mut self.events
    }

    /// A character is alive while it has health left and nobody has been
    /// recorded as its killer.
    pub fn is_alive(&self) -> bool {
        self.health > GameConfig::HEALTH_EPSILON && self.killer.is_none()
    }

    /// Reserve rounds of `kind` the inventory holds.
    pub fn reserve_ammo(&self, kind: ItemKind) -> u32 {
        self.inventory.total_quantity(kind)
    }

    /// Changes health by `delta`, clamped to `[0, max_health]`.
    ///
    /// Returns the change actually applied.
    pub fn modify_health(&mut self, delta: f32) -> f32 {
        let before = self.health;
        self.health = (self.health + delta).clamp(0.0, self.max_health);
        let applied = self.health - before;
        if applied.abs() > GameConfig::HEALTH_EPSILON {
            self.events.emit(&CharacterEvent::HealthChanged {
                health: self.health,
                delta: applied,
            });
        }
        applied
    }

    pub(crate) fn set_view(&mut self, view: Transform) {
        self.view = view;
    }

    /// Records the killer and exposes the body for looting.
    ///
    /// Returns false if a killer was already recorded.
    pub(crate) fn mark_killed(&mut self, killer: EntityId) -> bool {
        if self.killer.is_some() {
            return false;
        }
        debug!(target: "core::character", character = %self.id, %killer, "killed");
        self.killer = Some(killer);
        self.health = 0.0;
        self.corpse.activate();
        self.events.emit(&CharacterEvent::Died { killer });
        true
    }

    pub(crate) fn set_loot_source(&mut self, source: Option<EntityId>) -> bool {
        let changed = self.looting.set_source(source);
        if changed {
            self.events.emit(&CharacterEvent::LootMenu { source });
        }
        changed
    }

    pub(crate) fn clear_loot_source_if(&mut self, destroyed: EntityId) -> bool {
        let cleared = self.looting.source_destroyed(destroyed);
        if cleared {
            self.events.emit(&CharacterEvent::LootMenu { source: None });
        }
        cleared
    }

    pub(crate) fn set_weapon(&mut self, weapon: Option<Weapon>) {
        let entity = weapon.as_ref().map(Weapon::entity);
        self.weapon = weapon;
        self.events.emit(&CharacterEvent::WeaponChanged { weapon: entity });
    }

    pub(crate) fn apply_remote_health(&mut self, health: f32) {
        let delta = health - self.health;
        self.health = health.clamp(0.0, self.max_health);
        if delta.abs() > GameConfig::HEALTH_EPSILON {
            self.events.emit(&CharacterEvent::HealthChanged {
                health: self.health,
                delta,
            });
        }
    }

    pub(crate) fn apply_remote_killer(&mut self, killer: Option<EntityId>) {
        match killer {
            Some(killer) => {
                self.mark_killed(killer);
            }
            None => self.killer = None,
        }
    }
}
