//! Authority-to-observer state replication.
//!
//! Every replicated value has one writer, the authoritative [`World`](crate::world::World).
//! A [`ReplicationChannel`] remembers what one observer has already been sent
//! and turns the authority's current state into the minimal list of
//! [`StateSync`] messages that brings that observer up to date:
//!
//! - an inventory whose `items_key` moved gets a full [`StateSync::InventoryItems`]
//! - an item whose `rep_key` moved gets an [`StateSync::ItemPatch`] of the
//!   changed fields only
//! - per-entity fields are resent only when their value changed, and only to the
//!   observers their [`Audience`] allows
mod fields;
mod message;

pub use fields::{Audience, FieldTag, ItemFields};
pub use message::{EntitySnapshot, Intent, IntentEnvelope, StateSync};

use std::collections::{BTreeMap, BTreeSet};

use crate::inventory::Inventory;
use crate::types::{EntityId, ItemId};

/// Which replica of a world this is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum NetRole {
    /// The single replica allowed to mutate shared state.
    Authority,
    /// Predicts locally, forwards intents, and applies pushed state.
    Observer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ItemRecord {
    rep_key: u32,
    quantity: u32,
    equipped: bool,
}

#[derive(Clone, Debug, Default)]
struct InventoryRecord {
    items_key: u32,
    items: BTreeMap<ItemId, ItemRecord>,
}

/// Replication bookkeeping for one observer.
#[derive(Clone, Debug)]
pub struct ReplicationChannel {
    player: EntityId,
    known: BTreeSet<EntityId>,
    inventories: BTreeMap<EntityId, InventoryRecord>,
    fields: BTreeMap<(EntityId, FieldTag), StateSync>,
}

impl ReplicationChannel {
    /// Channel for the observer controlling `player`.
    pub fn new(player: EntityId) -> Self {
        Self {
            player,
            known: BTreeSet::new(),
            inventories: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    pub fn knows(&self, entity: EntityId) -> bool {
        self.known.contains(&entity)
    }

    pub fn known(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.known.iter().copied()
    }

    /// Announces `snapshot` unless the observer already knows the entity.
    pub fn spawn(&mut self, snapshot: EntitySnapshot, out: &mut Vec<StateSync>) {
        if self.known.insert(snapshot.id()) {
            out.push(StateSync::Spawned(snapshot));
        }
    }

    /// Forgets a known entity and everything recorded about it.
    pub fn destroy(&mut self, entity: EntityId, out: &mut Vec<StateSync>) {
        if !self.known.remove(&entity) {
            return;
        }
        self.inventories.remove(&entity);
        self.fields.retain(|(owner, _), _| *owner != entity);
        out.push(StateSync::Destroyed { entity });
    }

    /// Queues `value` for `entity` if its audience includes this observer and
    /// it differs from what was last sent.
    pub fn sync_field(
        &mut self,
        entity: EntityId,
        tag: FieldTag,
        value: StateSync,
        out: &mut Vec<StateSync>,
    ) -> bool {
        if !tag.reaches(entity, self.player) {
            return false;
        }
        let key = (entity, tag);
        if self.fields.get(&key) == Some(&value) {
            return false;
        }
        self.fields.insert(key, value.clone());
        out.push(value);
        true
    }

    /// Records `value` as already delivered, typically because a spawn
    /// snapshot carried it.
    pub fn remember(&mut self, entity: EntityId, tag: FieldTag, value: StateSync) {
        self.fields.insert((entity, tag), value);
    }

    /// Drops the record of `tag` so its next value is sent unconditionally.
    pub fn forget(&mut self, entity: EntityId, tag: FieldTag) {
        self.fields.remove(&(entity, tag));
    }

    /// Brings the observer's copy of `inventory` up to date.
    pub fn sync_inventory(&mut self, inventory: &Inventory, out: &mut Vec<StateSync>) {
        let owner = inventory.owner();
        let record = self.inventories.get(&owner);

        if record.is_none_or(|r| r.items_key != inventory.items_key()) {
            out.push(StateSync::InventoryItems {
                owner,
                items_key: inventory.items_key(),
                capacity: inventory.capacity(),
                weight_capacity: inventory.weight_capacity(),
                items: inventory.items().to_vec(),
            });
            let items = inventory
                .items()
                .iter()
                .map(|item| {
                    let record = ItemRecord {
                        rep_key: item.rep_key(),
                        quantity: item.quantity(),
                        equipped: item.is_equipped(),
                    };
                    (item.id(), record)
                })
                .collect();
            self.inventories.insert(
                owner,
                InventoryRecord {
                    items_key: inventory.items_key(),
                    items,
                },
            );
            return;
        }

        let Some(record) = self.inventories.get_mut(&owner) else {
            return;
        };
        for item in inventory.items() {
            let Some(sent) = record.items.get_mut(&item.id()) else {
                continue;
            };
            if sent.rep_key == item.rep_key() {
                continue;
            }

            let mut fields = ItemFields::empty();
            if sent.quantity != item.quantity() {
                fields |= ItemFields::QUANTITY;
            }
            if sent.equipped != item.is_equipped() {
                fields |= ItemFields::EQUIPPED;
            }
            *sent = ItemRecord {
                rep_key: item.rep_key(),
                quantity: item.quantity(),
                equipped: item.is_equipped(),
            };
            if fields.is_empty() {
                continue;
            }
            out.push(StateSync::ItemPatch {
                owner,
                item: item.id(),
                rep_key: item.rep_key(),
                fields,
                quantity: item.quantity(),
                equipped: item.is_equipped(),
            });
        }
    }

    /// Drops inventory records not in `visible`, so a later reopen starts
    /// with a full refresh.
    pub fn retain_inventories(&mut self, visible: &[EntityId]) {
        self.inventories.retain(|owner, _| visible.contains(owner));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemDefinition, ItemKind};

    const PLAYER: EntityId = EntityId(1);
    const OTHER: EntityId = EntityId(2);

    fn bag() -> Inventory {
        let mut inventory = Inventory::new(PLAYER, 10, 100.0);
        let ammo = ItemDefinition::new(ItemKind(1), "Ammo").with_max_stack(60);
        inventory.try_add_definition(&ammo, 40);
        inventory
    }

    #[test]
    fn first_sync_is_a_full_refresh_then_nothing() {
        let inventory = bag();
        let mut channel = ReplicationChannel::new(PLAYER);
        let mut out = Vec::new();

        channel.sync_inventory(&inventory, &mut out);
        channel.sync_inventory(&inventory, &mut out);

        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], StateSync::InventoryItems { .. }));
    }

    #[test]
    fn partial_consume_sends_quantity_patch_only() {
        let mut inventory = bag();
        let mut channel = ReplicationChannel::new(PLAYER);
        let mut out = Vec::new();
        channel.sync_inventory(&inventory, &mut out);
        out.clear();

        let stack = inventory.items()[0].id();
        inventory.consume(stack, 15);
        channel.sync_inventory(&inventory, &mut out);

        assert_eq!(
            out,
            vec![StateSync::ItemPatch {
                owner: PLAYER,
                item: stack,
                rep_key: inventory.items()[0].rep_key(),
                fields: ItemFields::QUANTITY,
                quantity: 25,
                equipped: false,
            }]
        );
    }

    #[test]
    fn removing_a_stack_forces_refresh() {
        let mut inventory = bag();
        let mut channel = ReplicationChannel::new(PLAYER);
        let mut out = Vec::new();
        channel.sync_inventory(&inventory, &mut out);
        out.clear();

        let stack = inventory.items()[0].id();
        inventory.consume(stack, 40);
        channel.sync_inventory(&inventory, &mut out);

        assert!(matches!(
            &out[..],
            [StateSync::InventoryItems { items, .. }] if items.is_empty()
        ));
    }

    #[test]
    fn fields_respect_audience_and_dedupe() {
        let mut channel = ReplicationChannel::new(PLAYER);
        let mut out = Vec::new();

        let own_health = StateSync::Health {
            entity: PLAYER,
            health: 80.0,
        };
        let other_health = StateSync::Health {
            entity: OTHER,
            health: 50.0,
        };
        let other_burst = StateSync::BurstCounter {
            owner: OTHER,
            counter: 2,
        };
        let own_burst = StateSync::BurstCounter {
            owner: PLAYER,
            counter: 2,
        };

        assert!(channel.sync_field(PLAYER, FieldTag::Health, own_health.clone(), &mut out));
        assert!(!channel.sync_field(PLAYER, FieldTag::Health, own_health, &mut out));
        assert!(!channel.sync_field(OTHER, FieldTag::Health, other_health, &mut out));
        assert!(channel.sync_field(OTHER, FieldTag::Burst, other_burst, &mut out));
        assert!(!channel.sync_field(PLAYER, FieldTag::Burst, own_burst, &mut out));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn destroy_forgets_entity_records() {
        let mut channel = ReplicationChannel::new(PLAYER);
        let mut out = Vec::new();
        let snapshot = EntitySnapshot::Character {
            id: OTHER,
            name: "other".into(),
            view: Default::default(),
            max_health: 100.0,
        };
        let killer = StateSync::Killer {
            entity: OTHER,
            killer: None,
        };

        channel.spawn(snapshot.clone(), &mut out);
        channel.spawn(snapshot, &mut out);
        channel.sync_field(OTHER, FieldTag::Killer, killer.clone(), &mut out);
        channel.destroy(OTHER, &mut out);
        channel.destroy(OTHER, &mut out);

        assert_eq!(out.len(), 3);
        assert!(!channel.knows(OTHER));
        // A recreated entity with the same id is announced again in full.
        channel.sync_field(OTHER, FieldTag::Killer, killer, &mut out);
        assert_eq!(out.len(), 4);
    }
}
