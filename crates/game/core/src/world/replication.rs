//! Both ends of replication: the authority collecting state for an observer,
//! the observer applying it, and the authority dispatching forwarded intents.
use tracing::{debug, info, trace, warn};

use super::World;
use crate::character::Character;
use crate::env::Env;
use crate::equipment::EquipSlot;
use crate::error::{Rejection, TargetIssue};
use crate::item::Item;
use crate::replication::{
    EntitySnapshot, FieldTag, Intent, IntentEnvelope, ItemFields, ReplicationChannel, StateSync,
};
use crate::types::{EntityId, ItemId};

impl World {
    /// Everything `channel`'s observer has not been sent yet, in apply order:
    /// removals, then new entities, then changed fields and inventories.
    pub fn collect_sync(&self, channel: &mut ReplicationChannel) -> Vec<StateSync> {
        let mut out = Vec::new();

        let gone: Vec<EntityId> = channel.known().filter(|id| !self.contains(*id)).collect();
        for entity in gone {
            channel.destroy(entity, &mut out);
        }

        for character in self.characters.values() {
            channel.spawn(
                EntitySnapshot::Character {
                    id: character.id(),
                    name: character.name().to_owned(),
                    view: character.view,
                    max_health: character.max_health(),
                },
                &mut out,
            );
        }
        for container in self.containers.values() {
            channel.spawn(
                EntitySnapshot::Container {
                    id: container.id(),
                    name: container.name().to_owned(),
                    transform: container.transform(),
                    capacity: container.inventory.capacity(),
                    weight_capacity: container.inventory.weight_capacity(),
                    interactable: container.interactable.clone(),
                },
                &mut out,
            );
        }
        for pickup in self.pickups.values() {
            let id = pickup.id();
            if !channel.knows(id) {
                channel.spawn(
                    EntitySnapshot::Pickup {
                        id,
                        transform: pickup.transform(),
                        item: pickup.item.clone(),
                        interactable: pickup.interactable.clone(),
                    },
                    &mut out,
                );
                channel.remember(id, FieldTag::PickupItem, pickup_item(id, &pickup.item));
                continue;
            }
            channel.sync_field(
                id,
                FieldTag::PickupItem,
                pickup_item(id, &pickup.item),
                &mut out,
            );
        }

        for character in self.characters.values() {
            sync_character(channel, character, &mut out);
        }

        let player = channel.player();
        let mut visible = Vec::with_capacity(2);
        if let Some(character) = self.characters.get(&player) {
            channel.sync_inventory(&character.inventory, &mut out);
            visible.push(player);
            if let Some(source) = character.loot_source()
                && let Some(stock) = self.inventory(source)
            {
                channel.sync_inventory(stock, &mut out);
                visible.push(source);
            }
        }
        channel.retain_inventories(&visible);

        if !out.is_empty() {
            trace!(target: "core::world", %player, messages = out.len(), "collected sync");
        }
        out
    }

    /// Overwrites local prediction with one authoritative message.
    ///
    /// Messages about entities this replica never saw are ignored.
    pub fn apply_sync(&mut self, sync: StateSync, env: &Env<'_>) {
        if self.is_authority() {
            warn!(target: "core::world", message = sync.name(), "authority received state sync");
            return;
        }
        trace!(target: "core::world", message = sync.name(), "applying sync");

        match sync {
            StateSync::Spawned(snapshot) => self.apply_spawn(snapshot),
            StateSync::Destroyed { entity } => {
                self.destroy_entity(entity, env);
            }
            StateSync::InventoryItems {
                owner,
                items_key,
                capacity,
                weight_capacity,
                items,
            } => {
                if let Some(inventory) = self.inventory_mut(owner) {
                    inventory.apply_remote_items(items_key, capacity, weight_capacity, items);
                    self.reconcile_equipment(owner);
                }
            }
            StateSync::ItemPatch {
                owner,
                item,
                rep_key,
                fields,
                quantity,
                equipped,
            } => {
                let applied = self
                    .inventory_mut(owner)
                    .is_some_and(|inv| inv.apply_remote_item(item, rep_key, quantity, equipped));
                if applied && fields.contains(ItemFields::EQUIPPED) {
                    self.reconcile_equipment(owner);
                }
            }
            StateSync::WeaponEquipped { owner, weapon } => {
                self.apply_remote_weapon(owner, weapon.as_ref(), env);
            }
            StateSync::MagazineAmmo { owner, ammo } => {
                if let Some(weapon) = self
                    .characters
                    .get_mut(&owner)
                    .and_then(|c| c.weapon.as_mut())
                {
                    weapon.apply_magazine(ammo);
                }
            }
            StateSync::BurstCounter { owner, counter } => {
                self.with_weapon(owner, None, env, |w, _, out| {
                    w.apply_burst_counter(counter, out)
                });
            }
            StateSync::PendingReload { owner, pending } => {
                self.with_weapon(owner, None, env, |w, _, out| {
                    w.apply_pending_reload(pending, out)
                });
            }
            StateSync::Health { entity, health } => {
                if let Some(character) = self.characters.get_mut(&entity) {
                    character.apply_remote_health(health);
                }
            }
            StateSync::Killer { entity, killer } => self.apply_remote_killer(entity, killer),
            StateSync::LootSource { looter, source } => {
                if let Some(character) = self.characters.get_mut(&looter) {
                    character.set_loot_source(source);
                }
            }
            StateSync::Interactable { entity, active } => {
                if let Some(interactable) = self.interactable_mut(entity) {
                    interactable.set_active(active);
                }
            }
            StateSync::View { entity, view } => {
                if !self.is_local(entity)
                    && let Some(character) = self.characters.get_mut(&entity)
                {
                    character.set_view(view);
                }
            }
            StateSync::PickupItem { pickup, item } => {
                if let Some(pickup) = self.pickups.get_mut(&pickup) {
                    pickup.item = item;
                }
            }
        }
    }

    fn apply_spawn(&mut self, snapshot: EntitySnapshot) {
        if self.contains(snapshot.id()) {
            return;
        }
        match snapshot {
            EntitySnapshot::Character {
                id,
                name,
                view,
                max_health,
            } => {
                let character = Character::new(id, name, view, &self.config).with_max_health(max_health);
                self.insert_character(character);
            }
            EntitySnapshot::Container {
                id,
                name,
                transform,
                capacity,
                weight_capacity,
                interactable,
            } => {
                self.insert_container(id, name, transform, capacity, weight_capacity, Some(interactable));
            }
            EntitySnapshot::Pickup {
                id,
                transform,
                item,
                interactable,
            } => self.insert_pickup(id, transform, item, Some(interactable)),
        }
    }

    fn apply_remote_killer(&mut self, entity: EntityId, killer: Option<EntityId>) {
        let Some(character) = self.characters.get_mut(&entity) else {
            return;
        };
        let was_alive = character.is_alive();
        character.apply_remote_killer(killer);
        if was_alive && !character.is_alive() {
            self.stop_interact_local(entity);
            if let Some(character) = self.characters.get_mut(&entity) {
                character.interaction.clear();
            }
        }
    }

    /// Rebuilds `owner`'s slot map from the equipped flags the authority sent.
    fn reconcile_equipment(&mut self, owner: EntityId) {
        let Some(character) = self.characters.get_mut(&owner) else {
            return;
        };
        let worn: Vec<(EquipSlot, ItemId)> = character
            .inventory
            .items()
            .iter()
            .filter(|item| item.is_equipped())
            .filter_map(|item| Some((item.equip_slot()?, item.id())))
            .collect();

        let stale: Vec<(EquipSlot, ItemId)> = character
            .equipment
            .iter()
            .filter(|occupied| !worn.contains(occupied))
            .collect();
        for (slot, item) in stale {
            character.equipment.unequip(slot, item);
        }
        for (slot, item) in worn {
            character.equipment.equip(slot, item);
        }
    }

    /// Lets go of the trigger, the interact key and any open loot session of a
    /// player whose controller went away. Authority only.
    pub fn release_player(&mut self, player: EntityId, env: &Env<'_>) {
        if !self.is_authority() || !self.characters.contains_key(&player) {
            return;
        }
        let armed = self.characters.get(&player).is_some_and(|c| c.weapon.is_some());
        let releases = [
            armed.then_some(Intent::StopFire),
            Some(Intent::StopInteract),
            Some(Intent::SetLootSource { source: None }),
        ];
        for intent in releases.into_iter().flatten() {
            let name = intent.name();
            let envelope = IntentEnvelope {
                actor: player,
                intent,
            };
            if let Err(rejection) = self.handle_intent(player, envelope, env) {
                debug!(target: "core::world", %player, intent = name, %rejection, "release skipped");
            }
        }
        info!(target: "core::world", %player, "player released");
    }

    /// Authority entry point for an intent the observer controlling `sender`
    /// forwarded.
    pub fn handle_intent(
        &mut self,
        sender: EntityId,
        envelope: IntentEnvelope,
        env: &Env<'_>,
    ) -> Result<(), Rejection> {
        if !self.is_authority() {
            return Err(Rejection::Unauthorized);
        }
        let IntentEnvelope { actor, intent } = envelope;
        if actor != sender {
            warn!(
                target: "core::world",
                %sender, %actor, intent = intent.name(),
                "intent for a character the sender does not control"
            );
            return Err(Rejection::InvalidTarget(TargetIssue::NotOwned));
        }
        debug!(target: "core::world", %actor, intent = intent.name(), "handling intent");

        match intent {
            Intent::StartFire => self.start_fire(actor, env),
            Intent::StopFire => self.stop_fire(actor, env),
            Intent::HandleFiring { aim } => self.confirm_shot(actor, aim, env),
            Intent::StartReload => self.start_reload(actor, env),
            Intent::BeginInteract => self.begin_interact(actor, env),
            Intent::StopInteract => self.stop_interact(actor, env),
            Intent::SetLootSource { source } => self.set_loot_source(actor, source, env),
            Intent::LootItem { kind, quantity } => {
                self.loot_item(actor, kind, quantity, env).map(|_| ())
            }
            Intent::UseItem { item } => self.use_item(actor, item, env),
            Intent::DropItem { item, quantity } => self.drop_item(actor, item, quantity, env),
            Intent::UseThrowable => self.use_throwable(actor, env),
            Intent::UpdateView { view } => self.set_view(actor, view),
        }
    }
}

fn pickup_item(pickup: EntityId, item: &Item) -> StateSync {
    StateSync::PickupItem {
        pickup,
        item: item.clone(),
    }
}

fn sync_character(channel: &mut ReplicationChannel, character: &Character, out: &mut Vec<StateSync>) {
    let entity = character.id();
    channel.sync_field(
        entity,
        FieldTag::View,
        StateSync::View {
            entity,
            view: character.view,
        },
        out,
    );
    channel.sync_field(
        entity,
        FieldTag::Health,
        StateSync::Health {
            entity,
            health: character.health(),
        },
        out,
    );
    channel.sync_field(
        entity,
        FieldTag::Killer,
        StateSync::Killer {
            entity,
            killer: character.killer(),
        },
        out,
    );
    channel.sync_field(
        entity,
        FieldTag::Corpse,
        StateSync::Interactable {
            entity,
            active: character.corpse.is_active(),
        },
        out,
    );
    channel.sync_field(
        entity,
        FieldTag::LootSource,
        StateSync::LootSource {
            looter: entity,
            source: character.loot_source(),
        },
        out,
    );
    let swapped = channel.sync_field(
        entity,
        FieldTag::Weapon,
        StateSync::WeaponEquipped {
            owner: entity,
            weapon: character.weapon.as_ref().map(|w| w.snapshot()),
        },
        out,
    );
    if swapped {
        // A fresh weapon starts from defaults on the observer.
        for tag in [FieldTag::Magazine, FieldTag::Burst, FieldTag::PendingReload] {
            channel.forget(entity, tag);
        }
    }

    let Some(weapon) = character.weapon.as_ref() else {
        return;
    };
    channel.sync_field(
        entity,
        FieldTag::Magazine,
        StateSync::MagazineAmmo {
            owner: entity,
            ammo: weapon.ammo_in_magazine(),
        },
        out,
    );
    channel.sync_field(
        entity,
        FieldTag::Burst,
        StateSync::BurstCounter {
            owner: entity,
            counter: weapon.burst_counter(),
        },
        out,
    );
    channel.sync_field(
        entity,
        FieldTag::PendingReload,
        StateSync::PendingReload {
            owner: entity,
            pending: weapon.is_pending_reload(),
        },
        out,
    );
}
