//! One replica of the simulated world.
//!
//! [`World`] owns every entity and the timer queue, and is the only place
//! cross-entity rules run: timers firing into weapons and interactions, loot
//! transfers between two inventories, damage from one character to another.
//!
//! The same type serves both roles. On the authority every verb mutates state
//! directly. On an observer the verbs predict what they safely can, queue an
//! [`IntentEnvelope`] in the outbox, and wait for [`World::apply_sync`] to
//! overwrite the prediction.
mod entities;
mod interaction;
mod inventory;
mod looting;
mod replication;
mod snapshot;
mod weapon;

pub use entities::{LootContainer, Pickup};
pub use snapshot::{CharacterSummary, ItemSummary, WeaponSummary, WorldSnapshot};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::character::Character;
use crate::config::GameConfig;
use crate::env::{Env, SpawnError, SpawnKind};
use crate::error::{Rejection, TargetIssue};
use crate::interaction::{InteractKind, Interactable};
use crate::inventory::Inventory;
use crate::item::{Item, ItemCatalog};
use crate::replication::{Intent, IntentEnvelope, NetRole};
use crate::timer::{TimerKey, TimerPurpose, TimerQueue};
use crate::types::{EntityId, ItemId, Millis, Transform};

pub struct World {
    role: NetRole,
    local_player: Option<EntityId>,
    now: Millis,
    config: GameConfig,
    catalog: Arc<dyn ItemCatalog>,
    characters: BTreeMap<EntityId, Character>,
    containers: BTreeMap<EntityId, LootContainer>,
    pickups: BTreeMap<EntityId, Pickup>,
    timers: TimerQueue,
    outbox: Vec<IntentEnvelope>,
}

impl World {
    pub fn new(role: NetRole, config: GameConfig, catalog: Arc<dyn ItemCatalog>) -> Self {
        Self {
            role,
            local_player: None,
            now: Millis::ZERO,
            config,
            catalog,
            characters: BTreeMap::new(),
            containers: BTreeMap::new(),
            pickups: BTreeMap::new(),
            timers: TimerQueue::new(),
            outbox: Vec::new(),
        }
    }

    /// The authoritative replica (dedicated server).
    pub fn authority(config: GameConfig, catalog: Arc<dyn ItemCatalog>) -> Self {
        Self::new(NetRole::Authority, config, catalog)
    }

    /// An observer replica controlling `player`.
    pub fn observer(config: GameConfig, catalog: Arc<dyn ItemCatalog>, player: EntityId) -> Self {
        Self::new(NetRole::Observer, config, catalog).with_local_player(player)
    }

    /// Marks `player` as controlled on this replica (owning client or listen host).
    pub fn with_local_player(mut self, player: EntityId) -> Self {
        self.local_player = Some(player);
        self
    }

    pub fn role(&self) -> NetRole {
        self.role
    }

    pub fn is_authority(&self) -> bool {
        self.role == NetRole::Authority
    }

    pub fn local_player(&self) -> Option<EntityId> {
        self.local_player
    }

    pub fn is_local(&self, entity: EntityId) -> bool {
        self.local_player == Some(entity)
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &dyn ItemCatalog {
        self.catalog.as_ref()
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn character(&self, id: EntityId) -> Option<&Character> {
        self.characters.get(&id)
    }

    pub fn character_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn container(&self, id: EntityId) -> Option<&LootContainer> {
        self.containers.get(&id)
    }

    pub fn containers(&self) -> impl Iterator<Item = &LootContainer> {
        self.containers.values()
    }

    pub fn pickup(&self, id: EntityId) -> Option<&Pickup> {
        self.pickups.get(&id)
    }

    pub fn pickups(&self) -> impl Iterator<Item = &Pickup> {
        self.pickups.values()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.characters.contains_key(&id)
            || self.containers.contains_key(&id)
            || self.pickups.contains_key(&id)
    }

    /// Inventory owned by a character or container.
    pub fn inventory(&self, owner: EntityId) -> Option<&Inventory> {
        self.characters
            .get(&owner)
            .map(|c| &c.inventory)
            .or_else(|| self.containers.get(&owner).map(|c| &c.inventory))
    }

    pub(crate) fn inventory_mut(&mut self, owner: EntityId) -> Option<&mut Inventory> {
        if let Some(character) = self.characters.get_mut(&owner) {
            return Some(&mut character.inventory);
        }
        self.containers.get_mut(&owner).map(|c| &mut c.inventory)
    }

    /// Interactable attached to a pickup, a container, or a corpse.
    pub fn interactable(&self, entity: EntityId) -> Option<&Interactable> {
        if let Some(pickup) = self.pickups.get(&entity) {
            return Some(&pickup.interactable);
        }
        if let Some(container) = self.containers.get(&entity) {
            return Some(&container.interactable);
        }
        self.characters.get(&entity).map(|c| &c.corpse)
    }

    pub(crate) fn interactable_mut(&mut self, entity: EntityId) -> Option<&mut Interactable> {
        if let Some(pickup) = self.pickups.get_mut(&entity) {
            return Some(&mut pickup.interactable);
        }
        if let Some(container) = self.containers.get_mut(&entity) {
            return Some(&mut container.interactable);
        }
        self.characters.get_mut(&entity).map(|c| &mut c.corpse)
    }

    /// Intents queued for the authority since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<IntentEnvelope> {
        std::mem::take(&mut self.outbox)
    }

    pub fn pending_intents(&self) -> &[IntentEnvelope] {
        &self.outbox
    }

    // ===== entity lifecycle =====

    pub fn spawn_character(
        &mut self,
        name: impl Into<String>,
        view: Transform,
        env: &Env<'_>,
    ) -> Result<EntityId, SpawnError> {
        let id = env.spawn(SpawnKind::Character, view)?;
        let character = Character::new(id, name, view, &self.config);
        info!(target: "core::world", entity = %id, name = character.name(), "character spawned");
        self.characters.insert(id, character);
        Ok(id)
    }

    pub fn spawn_container(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        env: &Env<'_>,
    ) -> Result<EntityId, SpawnError> {
        let id = env.spawn(SpawnKind::LootContainer, transform)?;
        self.insert_container(
            id,
            name.into(),
            transform,
            self.config.container_inventory_capacity,
            self.config.container_weight_capacity,
            None,
        );
        info!(target: "core::world", entity = %id, "container spawned");
        Ok(id)
    }

    /// Places `item` in the world as a pickup.
    pub fn spawn_pickup(
        &mut self,
        item: Item,
        transform: Transform,
        env: &Env<'_>,
    ) -> Result<EntityId, SpawnError> {
        let id = env.spawn(SpawnKind::Pickup, transform)?;
        self.insert_pickup(id, transform, item, None);
        debug!(target: "core::world", entity = %id, "pickup spawned");
        Ok(id)
    }

    pub(crate) fn insert_character(&mut self, character: Character) {
        self.characters.insert(character.id(), character);
    }

    pub(crate) fn insert_container(
        &mut self,
        id: EntityId,
        name: String,
        transform: Transform,
        capacity: usize,
        weight_capacity: f32,
        interactable: Option<Interactable>,
    ) {
        let interactable = interactable.unwrap_or_else(|| {
            Interactable::new(InteractKind::Loot, name.clone(), "Loot")
                .with_time(self.config.container_interaction_time)
                .with_distance(self.config.container_interaction_distance)
        });
        let inventory = Inventory::new(id, capacity, weight_capacity);
        self.containers.insert(
            id,
            LootContainer::new(id, name, transform, inventory, interactable),
        );
    }

    pub(crate) fn insert_pickup(
        &mut self,
        id: EntityId,
        transform: Transform,
        mut item: Item,
        interactable: Option<Interactable>,
    ) {
        item.reassign(ItemId::new(id, 0));
        item.set_equipped(false);
        let interactable = interactable.unwrap_or_else(|| {
            Interactable::new(InteractKind::Pickup, item.name(), "Take")
                .with_time(self.config.pickup_interaction_time)
                .with_distance(self.config.pickup_interaction_distance)
        });
        self.pickups
            .insert(id, Pickup::new(id, transform, item, interactable));
    }

    /// Removes an entity and everything that refers to it.
    ///
    /// Cancels all of its timers, ends loot sessions pointing at it, and drops
    /// it from every focus. A character also lets go of whatever it was
    /// interacting with. Returns false for unknown entities.
    pub fn destroy_entity(&mut self, entity: EntityId, env: &Env<'_>) -> bool {
        if let Some(target) = self
            .characters
            .get(&entity)
            .and_then(|c| c.interaction.focus())
        {
            self.release(entity, target);
        }

        let weapon = if let Some(character) = self.characters.remove(&entity) {
            character.weapon.map(|w| w.entity())
        } else if self.containers.remove(&entity).is_some() || self.pickups.remove(&entity).is_some()
        {
            None
        } else {
            return false;
        };

        self.timers.cancel_entity(entity);

        let authority = self.is_authority();
        for character in self.characters.values_mut() {
            if character.clear_loot_source_if(entity) {
                debug!(target: "core::world", looter = %character.id(), source = %entity, "loot source destroyed");
            }
            if character.interaction.focus() == Some(entity) {
                character.interaction.clear();
                self.timers
                    .cancel(TimerKey::new(character.id(), TimerPurpose::Interaction));
            }
        }

        if authority {
            if let Some(weapon) = weapon {
                env.destroy(weapon);
            }
            env.destroy(entity);
        }
        info!(target: "core::world", %entity, "entity destroyed");
        true
    }

    // ===== clock =====

    /// Moves the clock to `now`, firing due timers in deadline order, then
    /// polls interaction focus.
    pub fn advance(&mut self, now: Millis, env: &Env<'_>) {
        debug_assert!(now >= self.now, "clock moved backwards: {} -> {now}", self.now);
        while let Some((key, due)) = self.timers.pop_due(now) {
            self.now = due.max(self.now);
            self.fire_timer(key, env);
        }
        self.now = now.max(self.now);
        self.poll_interactions(env);
    }

    fn fire_timer(&mut self, key: TimerKey, env: &Env<'_>) {
        match key.purpose {
            TimerPurpose::Interaction => self.commit_interaction(key.entity, env),
            TimerPurpose::ReloadFinish
            | TimerPurpose::ReloadTransfer
            | TimerPurpose::Refire
            | TimerPurpose::EquipFinish => self.weapon_timer(key.entity, key.purpose, env),
            TimerPurpose::Despawn => {
                self.destroy_entity(key.entity, env);
            }
        }
    }

    pub(crate) fn schedule(&mut self, entity: EntityId, purpose: TimerPurpose, delay: Millis) {
        self.timers
            .schedule(TimerKey::new(entity, purpose), self.now, delay);
    }

    pub(crate) fn cancel(&mut self, entity: EntityId, purpose: TimerPurpose) -> bool {
        self.timers.cancel(TimerKey::new(entity, purpose))
    }

    // ===== authority gate =====

    /// Observers may only act for their own player.
    fn ensure_controls(&self, actor: EntityId) -> Result<(), Rejection> {
        if self.is_authority() || self.is_local(actor) {
            Ok(())
        } else {
            Err(Rejection::InvalidTarget(TargetIssue::NotOwned))
        }
    }

    fn forward(&mut self, actor: EntityId, intent: Intent) {
        debug_assert!(!self.is_authority(), "authority forwarding {}", intent.name());
        debug!(target: "core::world", %actor, intent = intent.name(), "forwarding intent");
        self.outbox.push(IntentEnvelope { actor, intent });
    }

    fn require_character(&self, id: EntityId) -> Result<&Character, Rejection> {
        self.characters
            .get(&id)
            .ok_or(Rejection::InvalidTarget(TargetIssue::Missing))
    }

    /// Changes the view point of `actor`. Observers forward it so authority
    /// probes start from the same place.
    pub fn set_view(&mut self, actor: EntityId, view: Transform) -> Result<(), Rejection> {
        self.ensure_controls(actor)?;
        let character = self
            .characters
            .get_mut(&actor)
            .ok_or(Rejection::InvalidTarget(TargetIssue::Missing))?;
        if character.view == view {
            return Ok(());
        }
        character.set_view(view);
        if !self.is_authority() {
            self.forward(actor, Intent::UpdateView { view });
        }
        Ok(())
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("role", &self.role)
            .field("local_player", &self.local_player)
            .field("now", &self.now)
            .field("characters", &self.characters.len())
            .field("containers", &self.containers.len())
            .field("pickups", &self.pickups.len())
            .field("timers", &self.timers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
