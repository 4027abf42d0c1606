use std::sync::{Arc, Mutex};

use super::*;
use crate::equipment::EquipSlot;
use crate::error::CapacityLimit;
use crate::item::EquipRole;

const OWNER: EntityId = EntityId(7);

fn token(max_stack: u32) -> ItemDefinition {
    ItemDefinition::new(ItemKind(1), "Token").with_max_stack(max_stack)
}

fn ammo() -> ItemDefinition {
    ItemDefinition::new(ItemKind(2), "Rifle Ammo")
        .with_weight(0.25)
        .with_max_stack(90)
}

fn crate_of_bricks(weight: f32) -> ItemDefinition {
    ItemDefinition::new(ItemKind(3), "Bricks")
        .with_weight(weight)
        .non_stackable()
}

fn template(definition: &ItemDefinition, quantity: u32) -> Item {
    definition.instantiate(ItemId::new(EntityId(99), 0), quantity)
}

fn assert_invariants(inventory: &Inventory) {
    assert!(inventory.len() <= inventory.capacity());
    let weighted: f32 = inventory
        .items()
        .iter()
        .filter(|i| !i.is_weightless())
        .map(Item::stack_weight)
        .sum();
    assert!(weighted <= inventory.weight_capacity() + f32::EPSILON);
    for item in inventory.items() {
        assert!(item.quantity() <= item.max_quantity());
    }
}

#[test]
fn stacking_caps_at_max_stack() {
    let mut inventory = Inventory::new(OWNER, 1, 100.0);
    let kind = token(10);

    let first = inventory.try_add(&template(&kind, 5));
    assert_eq!(first, AddResult::all(5));
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory.total_quantity(kind.kind), 5);

    let second = inventory.try_add(&template(&kind, 10));
    assert_eq!(second.status, AddStatus::Some);
    assert_eq!((second.requested, second.granted), (10, 5));
    assert_eq!(second.reason, Some(Rejection::StackFull));
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory.total_quantity(kind.kind), 10);

    let third = inventory.try_add(&template(&kind, 1));
    assert_eq!(third, AddResult::none(1, Rejection::StackFull));
    assert_invariants(&inventory);
}

#[test]
fn heavy_item_is_rejected_with_weight_reason() {
    let mut inventory = Inventory::new(OWNER, 5, 10.0);

    let result = inventory.try_add(&template(&crate_of_bricks(15.0), 1));

    assert_eq!(result.status, AddStatus::None);
    assert_eq!(
        result.reason,
        Some(Rejection::CapacityExceeded(CapacityLimit::Weight))
    );
    assert!(result.message().is_some_and(|m| m.contains("weight")));
    assert!(inventory.is_empty());
}

#[test]
fn full_inventory_rejects_new_slot() {
    let mut inventory = Inventory::new(OWNER, 1, 100.0);
    inventory.try_add(&template(&crate_of_bricks(1.0), 1));

    let result = inventory.try_add(&template(&crate_of_bricks(1.0), 1));

    assert_eq!(result, AddResult::none(1, Rejection::full()));
    assert!(result.message().is_some_and(|m| m.contains("full")));
}

#[test]
fn weight_limits_partial_stack() {
    let mut inventory = Inventory::new(OWNER, 5, 5.0);
    let ammo = ammo();
    inventory.try_add(&template(&ammo, 10)); // 2.5 weight

    let result = inventory.try_add(&template(&ammo, 30));

    // 2.5 free weight / 0.25 per round
    assert_eq!(result.granted, 10);
    assert_eq!(result.status, AddStatus::Some);
    assert_eq!(result.reason, Some(Rejection::too_heavy()));
    assert_eq!(inventory.total_quantity(ammo.kind), 20);
    assert_invariants(&inventory);
}

#[test]
fn weightless_items_bypass_weight_check() {
    let mut inventory = Inventory::new(OWNER, 5, 0.0);

    let result = inventory.try_add(&template(&token(50), 40));

    assert!(result.is_complete());
    assert_invariants(&inventory);
}

#[test]
fn added_items_are_fresh_instances() {
    let mut inventory = Inventory::new(OWNER, 5, 100.0);
    let source = template(&crate_of_bricks(1.0), 1);

    inventory.try_add(&source);
    inventory.try_add(&source);

    let ids: Vec<_> = inventory.items().iter().map(Item::id).collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert!(ids.iter().all(|id| id.minted_by() == OWNER));
    assert!(!ids.contains(&source.id()));
}

#[test]
fn adding_equipped_copy_arrives_unequipped() {
    let mut inventory = Inventory::new(OWNER, 5, 100.0);
    let vest = ItemDefinition::new(ItemKind(4), "Vest").equippable(EquipSlot::Vest, EquipRole::Gear);
    let mut source = template(&vest, 1);
    source.set_equipped(true);

    inventory.try_add(&source);

    assert!(!inventory.items()[0].is_equipped());
}

#[test]
fn consume_partial_only_patches_the_item() {
    let mut inventory = Inventory::new(OWNER, 5, 100.0);
    inventory.try_add(&template(&ammo(), 30));
    let item = inventory.items()[0].id();
    let (list_key, item_key) = (inventory.items_key(), inventory.items()[0].rep_key());

    let removed = inventory.consume(item, 12);

    assert_eq!(removed, 12);
    assert_eq!(inventory.get(item).map(Item::quantity), Some(18));
    assert_eq!(inventory.items_key(), list_key);
    assert_ne!(inventory.items()[0].rep_key(), item_key);
}

#[test]
fn consume_everything_removes_the_stack() {
    let mut inventory = Inventory::new(OWNER, 5, 100.0);
    inventory.try_add(&template(&ammo(), 3));
    let item = inventory.items()[0].id();
    let list_key = inventory.items_key();

    let removed = inventory.consume(item, 5);

    assert_eq!(removed, 3);
    assert!(inventory.get(item).is_none());
    assert_ne!(inventory.items_key(), list_key);
}

#[test]
fn consume_kind_drains_across_stacks() {
    let mut inventory = Inventory::new(OWNER, 5, 100.0);
    let kind = token(2);
    inventory.try_add(&template(&kind, 2));
    // Second stack of the same kind minted directly.
    let extra = template(&kind, 2);
    inventory.push(extra);

    assert_eq!(inventory.total_quantity(kind.kind), 4);
    assert_eq!(inventory.consume_kind(kind.kind, 3), 3);
    assert_eq!(inventory.total_quantity(kind.kind), 1);
    assert!(inventory.has_item(kind.kind, 1));
    assert!(!inventory.has_item(kind.kind, 2));
}

#[test]
fn definition_requests_above_one_stack_report_truncation() {
    let mut inventory = Inventory::new(OWNER, 5, 100.0);

    let result = inventory.try_add_definition(&ammo(), 120);

    assert_eq!((result.requested, result.granted), (120, 90));
    assert_eq!(result.status, AddStatus::Some);
    assert_eq!(inventory.try_add_definition(&ammo(), 0), AddResult::nothing());
}

#[test]
fn events_follow_mutations() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut inventory = Inventory::new(OWNER, 5, 100.0);
    let sink = Arc::clone(&log);
    inventory
        .events_mut()
        .subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    inventory.try_add(&template(&ammo(), 4));
    let item = inventory.items()[0].id();
    inventory.consume(item, 1);
    inventory.consume(item, 3);
    inventory.set_capacity(6);

    let log = log.lock().unwrap();
    assert!(matches!(log[0], InventoryEvent::ItemAdded { quantity: 4, .. }));
    assert_eq!(log[1], InventoryEvent::QuantityChanged { item, quantity: 3 });
    assert!(matches!(log[2], InventoryEvent::ItemRemoved { .. }));
    assert_eq!(log[3], InventoryEvent::Refreshed);
}

#[test]
fn mixed_sequence_keeps_invariants() {
    let mut inventory = Inventory::new(OWNER, 3, 6.0);
    let defs = [ammo(), crate_of_bricks(2.5), token(3)];

    for round in 0..20u32 {
        let definition = &defs[(round % 3) as usize];
        inventory.try_add_definition(definition, round % 7 + 1);
        assert_invariants(&inventory);
        if round % 4 == 0
            && let Some(first) = inventory.items().first().map(Item::id)
        {
            inventory.consume(first, 2);
            assert_invariants(&inventory);
        }
    }
}
