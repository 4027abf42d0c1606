use std::sync::Arc;

use super::*;
use crate::env::{FixedProbe, RecordingEffects, RecordingNotifications, SequentialSpawner};
use crate::equipment::EquipSlot;
use crate::error::NotReadyReason;
use crate::item::{EquipRole, ItemDefinition, ItemKind, ItemTable};
use crate::replication::{ReplicationChannel, StateSync};
use crate::weapon::{WeaponSpec, WeaponState};

const AMMO: ItemKind = ItemKind(1);
const RIFLE: ItemKind = ItemKind(2);
const FOOD: ItemKind = ItemKind(3);
const HELMET: ItemKind = ItemKind(4);
const GRENADE: ItemKind = ItemKind(5);

/// First id the rig's spawner hands out.
const FIRST: EntityId = EntityId(1000);

fn rifle_spec() -> WeaponSpec {
    WeaponSpec {
        magazine_capacity: 30,
        time_between_shots: Millis(100),
        reload_duration: Millis(500),
        equip_duration: Millis(300),
        ammo_kind: AMMO,
        damage: 25.0,
        range: 5000.0,
    }
}

fn catalog() -> Arc<ItemTable> {
    Arc::new(ItemTable::new([
        ItemDefinition::new(AMMO, "Rifle Ammo").with_max_stack(60),
        ItemDefinition::new(RIFLE, "Rifle")
            .with_weight(4.0)
            .equippable(EquipSlot::PrimaryWeapon, EquipRole::Weapon(rifle_spec())),
        ItemDefinition::new(FOOD, "Canned Food")
            .with_weight(0.5)
            .with_max_stack(5)
            .food(25.0),
        ItemDefinition::new(HELMET, "Helmet")
            .with_weight(2.0)
            .equippable(EquipSlot::Helmet, EquipRole::Gear),
        ItemDefinition::new(GRENADE, "Grenade")
            .with_weight(1.0)
            .equippable(EquipSlot::Throwable, EquipRole::Throwable { damage: 80.0 }),
    ]))
}

struct Rig {
    probe: FixedProbe,
    effects: RecordingEffects,
    notes: RecordingNotifications,
    spawner: SequentialSpawner,
}

impl Rig {
    fn new() -> Self {
        Self {
            probe: FixedProbe::new(),
            effects: RecordingEffects::new(),
            notes: RecordingNotifications::new(),
            spawner: SequentialSpawner::starting_at(FIRST.0),
        }
    }

    fn env(&self) -> Env<'_> {
        Env::with_all(&self.probe, &self.effects, &self.notes, &self.spawner)
    }
}

/// Listen host whose own player is the first spawned entity.
fn host() -> World {
    World::authority(GameConfig::default(), catalog()).with_local_player(FIRST)
}

fn dedicated(config: GameConfig) -> World {
    World::authority(config, catalog())
}

fn spawn(world: &mut World, name: &str, env: &Env<'_>) -> EntityId {
    world
        .spawn_character(name, Transform::IDENTITY, env)
        .expect("spawn character")
}

fn held(world: &World, owner: EntityId, kind: ItemKind) -> u32 {
    world
        .inventory(owner)
        .map_or(0, |inventory| inventory.total_quantity(kind))
}

fn stack(world: &World, owner: EntityId, kind: ItemKind) -> ItemId {
    world
        .inventory(owner)
        .and_then(|inventory| inventory.find(kind))
        .map(Item::id)
        .expect("stack present")
}

fn magazine(world: &World, owner: EntityId) -> u32 {
    world
        .character(owner)
        .and_then(Character::weapon)
        .map_or(0, |w| w.ammo_in_magazine())
}

#[test]
fn ammo_is_conserved_across_equip_fire_and_unequip() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = host();
    let ada = spawn(&mut world, "Ada", &env);
    assert_eq!(ada, FIRST);

    world.give_kind(ada, AMMO, 50, &env);
    world.give_kind(ada, RIFLE, 1, &env);
    let rifle = stack(&world, ada, RIFLE);
    assert_eq!(
        world.character(ada).and_then(|c| c.equipment().occupant(EquipSlot::PrimaryWeapon)),
        Some(rifle),
        "rifle auto-equips into a free slot"
    );

    // Equip finishes at 300, the empty magazine reloads, rounds move at 700.
    world.advance(Millis(800), &env);
    assert_eq!(magazine(&world, ada), 30);
    assert_eq!(held(&world, ada, AMMO), 20);

    world.start_fire(ada, &env).expect("trigger");
    world.advance(Millis(1000), &env);
    world.stop_fire(ada, &env).expect("release");
    let shots = 30 - magazine(&world, ada);
    assert_eq!(shots, 3);
    assert_eq!(held(&world, ada, AMMO) + magazine(&world, ada) + shots, 50);

    world.use_item(ada, rifle, &env).expect("unequip");
    assert!(world.character(ada).and_then(Character::weapon).is_none());
    assert_eq!(held(&world, ada, AMMO) + shots, 50);
    assert_eq!(rig.spawner.destroyed(), vec![EntityId(1001)]);
}

#[test]
fn host_shots_damage_and_kill_what_they_hit() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = host();
    let ada = spawn(&mut world, "Ada", &env);
    let bob = spawn(&mut world, "Bob", &env);
    world.give_kind(ada, AMMO, 60, &env);
    world.give_kind(ada, RIFLE, 1, &env);
    world.advance(Millis(800), &env);

    rig.probe.set(bob, 300.0);
    world.start_fire(ada, &env).expect("trigger");
    world.advance(Millis(1200), &env);
    world.stop_fire(ada, &env).expect("release");

    let body = world.character(bob).expect("corpse stays");
    assert!(!body.is_alive());
    assert_eq!(body.killer(), Some(ada));
    assert!(body.corpse().is_active());
    assert!(world.timers().is_active(TimerKey::new(bob, TimerPurpose::Despawn)));
    assert!(rig.effects.count("weapon.impact") >= 4);
}

#[test]
fn looting_a_corpse_moves_at_most_its_stock() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = dedicated(GameConfig {
        dead_body_lifespan: Millis::from_secs(10),
        loot_grace_period: Millis::from_secs(60),
        ..GameConfig::default()
    });
    let ada = spawn(&mut world, "Ada", &env);
    let bob = spawn(&mut world, "Bob", &env);
    world.give_kind(ada, FOOD, 3, &env);

    assert_eq!(
        world.set_loot_source(bob, Some(ada), &env),
        Err(Rejection::InvalidTarget(TargetIssue::Unavailable)),
        "the living cannot be looted"
    );

    world.take_damage(ada, 500.0, bob, &env);
    world.set_loot_source(bob, Some(ada), &env).expect("open corpse");
    let result = world.loot_item(bob, FOOD, 5, &env).expect("loot");

    assert_eq!(result.granted, 3);
    assert_eq!(held(&world, bob, FOOD), 3);
    assert_eq!(held(&world, ada, FOOD), 0);
    assert!(world.inventory(ada).is_some_and(Inventory::is_empty));

    // Looting kept the body past its own lifespan.
    world.advance(Millis::from_secs(30), &env);
    assert!(world.contains(ada));
    world.advance(Millis::from_secs(61), &env);
    assert!(!world.contains(ada));
    assert_eq!(world.character(bob).and_then(Character::loot_source), None);
}

#[test]
fn loot_requires_an_open_session() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = dedicated(GameConfig::default());
    let ada = spawn(&mut world, "Ada", &env);

    assert_eq!(
        world.loot_item(ada, FOOD, 1, &env),
        Err(Rejection::InvalidTarget(TargetIssue::NoLootSession))
    );
}

#[test]
fn container_loot_reports_partial_grants() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = dedicated(GameConfig::default().with_character_inventory(20, 1.0));
    let ada = spawn(&mut world, "Ada", &env);
    let crate_id = world
        .spawn_container("Crate", Transform::IDENTITY, &env)
        .expect("container");
    world.give_kind(crate_id, FOOD, 5, &env);
    world.give_kind(ada, FOOD, 1, &env);

    world.set_loot_source(ada, Some(crate_id), &env).expect("open");
    let result = world.loot_item(ada, FOOD, 5, &env).expect("loot");

    assert_eq!(result.granted, 1);
    assert_eq!(held(&world, ada, FOOD), 2);
    assert_eq!(held(&world, crate_id, FOOD), 4);
    let message = rig.notes.last_for(ada).expect("told why");
    assert!(message.contains("weight"), "{message}");
}

#[test]
fn held_interaction_takes_pickup_when_countdown_ends() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = host();
    let ada = spawn(&mut world, "Ada", &env);
    let food = catalog()
        .definition(FOOD)
        .expect("food")
        .instantiate(ItemId::new(EntityId(0), 0), 2);
    let pickup = world
        .spawn_pickup(food, Transform::IDENTITY, &env)
        .expect("pickup");
    rig.probe.set(pickup, 50.0);

    world.begin_interact(ada, &env).expect("press");
    world.advance(Millis(250), &env);
    let progress = world.interaction_progress(ada).expect("counting down");
    assert!((progress - 0.5).abs() < 1.0e-3);

    world.advance(Millis(500), &env);
    assert_eq!(held(&world, ada, FOOD), 2);
    assert!(world.pickup(pickup).is_none());
    assert!(rig.spawner.destroyed().contains(&pickup));
    assert_eq!(world.character(ada).and_then(|c| c.interaction().focus()), None);
}

#[test]
fn looking_away_cancels_the_hold() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = host();
    let ada = spawn(&mut world, "Ada", &env);
    let food = catalog()
        .definition(FOOD)
        .expect("food")
        .instantiate(ItemId::new(EntityId(0), 0), 1);
    let pickup = world
        .spawn_pickup(food, Transform::IDENTITY, &env)
        .expect("pickup");
    rig.probe.set(pickup, 50.0);

    world.begin_interact(ada, &env).expect("press");
    rig.probe.clear();
    world.advance(Millis(100), &env);
    world.advance(Millis(1000), &env);

    assert_eq!(held(&world, ada, FOOD), 0);
    assert!(world.pickup(pickup).is_some_and(|p| p.interactable().interactors().is_empty()));
    assert_eq!(world.interaction_progress(ada), None);
}

#[test]
fn dropped_items_land_as_pickups() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = dedicated(GameConfig::default());
    let ada = spawn(&mut world, "Ada", &env);
    world.give_kind(ada, FOOD, 3, &env);

    world
        .drop_item(ada, stack(&world, ada, FOOD), 2, &env)
        .expect("drop");

    assert_eq!(held(&world, ada, FOOD), 1);
    let dropped: Vec<&Pickup> = world.pickups().collect();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].item().quantity(), 2);
    assert_eq!(dropped[0].item().id(), ItemId::new(dropped[0].id(), 0));
}

#[test]
fn dropping_an_equipped_helmet_unequips_it() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = dedicated(GameConfig::default());
    let ada = spawn(&mut world, "Ada", &env);
    world.give_kind(ada, HELMET, 1, &env);
    let helmet = stack(&world, ada, HELMET);
    assert!(world.character(ada).is_some_and(|c| c.equipment().occupant(EquipSlot::Helmet) == Some(helmet)));

    world.drop_item(ada, helmet, 1, &env).expect("drop");

    let ada = world.character(ada).expect("ada");
    assert!(ada.equipment().is_empty());
    assert!(ada.inventory().is_empty());
    assert!(world.pickups().all(|p| !p.item().is_equipped()));
}

#[test]
fn eating_heals_only_when_hurt() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = dedicated(GameConfig::default());
    let ada = spawn(&mut world, "Ada", &env);
    let bob = spawn(&mut world, "Bob", &env);
    world.give_kind(ada, FOOD, 2, &env);
    let food = stack(&world, ada, FOOD);

    world.use_item(ada, food, &env).expect("use");
    assert_eq!(held(&world, ada, FOOD), 2);
    assert_eq!(rig.notes.count_for(ada, "No need to eat"), 1);

    world.take_damage(ada, 30.0, bob, &env);
    world.use_item(ada, food, &env).expect("use");
    assert_eq!(held(&world, ada, FOOD), 1);
    assert!((world.character(ada).map_or(0.0, Character::health) - 95.0).abs() < 1.0e-3);
}

#[test]
fn no_auto_equip_while_looting() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = dedicated(GameConfig::default());
    let ada = spawn(&mut world, "Ada", &env);
    let crate_id = world
        .spawn_container("Crate", Transform::IDENTITY, &env)
        .expect("container");
    world.give_kind(crate_id, HELMET, 1, &env);

    world.set_loot_source(ada, Some(crate_id), &env).expect("open");
    world.loot_item(ada, HELMET, 1, &env).expect("loot");

    let ada = world.character(ada).expect("ada");
    assert_eq!(ada.inventory().total_quantity(HELMET), 1);
    assert!(ada.equipment().is_empty());
}

#[test]
fn throwing_spawns_a_projectile_and_uses_one_unit() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = dedicated(GameConfig::default());
    let ada = spawn(&mut world, "Ada", &env);

    assert_eq!(
        world.use_throwable(ada, &env),
        Err(Rejection::NotReady(NotReadyReason::NoThrowable))
    );
    assert_eq!(rig.notes.count_for(ada, "No throwable"), 1);

    world.give_kind(ada, GRENADE, 1, &env);
    world.use_throwable(ada, &env).expect("throw");

    let ada = world.character(ada).expect("ada");
    assert_eq!(ada.inventory().total_quantity(GRENADE), 0);
    assert_eq!(ada.equipment().occupant(EquipSlot::Throwable), None);
    assert_eq!(rig.effects.count("throwable.toss"), 1);
}

#[test]
fn destroying_a_character_cancels_its_timers() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = host();
    let ada = spawn(&mut world, "Ada", &env);
    world.give_kind(ada, AMMO, 60, &env);
    world.give_kind(ada, RIFLE, 1, &env);
    assert!(!world.timers().is_empty());

    assert!(world.destroy_entity(ada, &env));
    assert!(!world.destroy_entity(ada, &env));
    assert!(world.timers().is_empty());
    assert!(rig.spawner.destroyed().contains(&EntityId(1001)));

    world.advance(Millis(5000), &env);
}

#[test]
fn intents_for_someone_elses_character_are_refused() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = dedicated(GameConfig::default());
    let ada = spawn(&mut world, "Ada", &env);
    let bob = spawn(&mut world, "Bob", &env);

    let forged = IntentEnvelope {
        actor: ada,
        intent: Intent::StopInteract,
    };
    assert_eq!(
        world.handle_intent(bob, forged.clone(), &env),
        Err(Rejection::InvalidTarget(TargetIssue::NotOwned))
    );
    assert_eq!(world.handle_intent(ada, forged, &env), Ok(()));

    let mut observer = World::observer(GameConfig::default(), catalog(), ada);
    let envelope = IntentEnvelope {
        actor: ada,
        intent: Intent::StartFire,
    };
    assert_eq!(
        observer.handle_intent(ada, envelope, &env),
        Err(Rejection::Unauthorized)
    );
}

#[test]
fn observer_forwards_and_converges_on_authority_state() {
    let server_rig = Rig::new();
    let server_env = server_rig.env();
    let client_rig = Rig::new();
    let client_env = client_rig.env();

    let mut server = dedicated(GameConfig::default());
    let ada = spawn(&mut server, "Ada", &server_env);
    server.give_kind(ada, AMMO, 40, &server_env);
    server.give_kind(ada, RIFLE, 1, &server_env);

    let mut client = World::observer(GameConfig::default(), catalog(), ada);
    let mut channel = ReplicationChannel::new(ada);
    for sync in server.collect_sync(&mut channel) {
        client.apply_sync(sync, &client_env);
    }

    let mirrored = client.character(ada).expect("replicated");
    assert_eq!(mirrored.inventory().total_quantity(AMMO), 40);
    let rifle = stack(&client, ada, RIFLE);
    assert_eq!(mirrored.equipment().occupant(EquipSlot::PrimaryWeapon), Some(rifle));
    assert_eq!(
        mirrored.weapon().map(|w| w.entity()),
        server.character(ada).and_then(Character::weapon).map(|w| w.entity())
    );
    assert!(server.collect_sync(&mut channel).is_empty());

    // Client drops five rounds: nothing changes locally until the server answers.
    let ammo = stack(&client, ada, AMMO);
    client.drop_item(ada, ammo, 5, &client_env).expect("forwarded");
    assert_eq!(held(&client, ada, AMMO), 40);
    let outbox = client.drain_outbox();
    assert_eq!(outbox.len(), 1);
    for envelope in outbox {
        server.handle_intent(ada, envelope, &server_env).expect("server drop");
    }
    assert_eq!(held(&server, ada, AMMO), 35);

    let syncs = server.collect_sync(&mut channel);
    assert!(syncs.iter().any(|s| matches!(s, StateSync::ItemPatch { .. })));
    assert!(syncs.iter().any(|s| matches!(s, StateSync::Spawned(_))));
    for sync in syncs {
        client.apply_sync(sync, &client_env);
    }
    assert_eq!(held(&client, ada, AMMO), 35);
    assert_eq!(client.pickups().count(), 1);
}

#[test]
fn other_inventories_replicate_only_while_looted() {
    let rig = Rig::new();
    let env = rig.env();
    let mut server = dedicated(GameConfig::default());
    let ada = spawn(&mut server, "Ada", &env);
    let bob = spawn(&mut server, "Bob", &env);
    server.give_kind(ada, FOOD, 3, &env);
    let mut bobs_view = ReplicationChannel::new(bob);

    let ada_items = |syncs: &[StateSync]| {
        syncs
            .iter()
            .any(|s| matches!(s, StateSync::InventoryItems { owner, .. } if *owner == ada))
    };
    assert!(!ada_items(&server.collect_sync(&mut bobs_view)));

    server.take_damage(ada, 500.0, bob, &env);
    server.set_loot_source(bob, Some(ada), &env).expect("open");
    let syncs = server.collect_sync(&mut bobs_view);
    assert!(ada_items(&syncs));
    assert!(syncs.contains(&StateSync::Interactable {
        entity: ada,
        active: true
    }));
    assert!(!syncs.iter().any(|s| matches!(s, StateSync::Health { entity, .. } if *entity == ada)));

    server.set_loot_source(bob, None, &env).expect("close");
    server.collect_sync(&mut bobs_view);
    server.set_loot_source(bob, Some(ada), &env).expect("reopen");
    assert!(ada_items(&server.collect_sync(&mut bobs_view)), "reopen starts with a full refresh");
}

#[test]
fn observer_predicts_weapon_state_and_defers_damage() {
    let server_rig = Rig::new();
    let server_env = server_rig.env();
    let client_rig = Rig::new();
    let client_env = client_rig.env();

    let mut server = dedicated(GameConfig::default());
    let ada = spawn(&mut server, "Ada", &server_env);
    let bob = spawn(&mut server, "Bob", &server_env);
    server.give_kind(ada, AMMO, 60, &server_env);
    server.give_kind(ada, RIFLE, 1, &server_env);
    server.advance(Millis(300), &server_env);
    // A dedicated server has no local player, so nothing reloads on its own.
    assert_eq!(magazine(&server, ada), 0);
    server.start_reload(ada, &server_env).expect("reload");
    server.advance(Millis(800), &server_env);
    assert_eq!(magazine(&server, ada), 30);

    let mut client = World::observer(GameConfig::default(), catalog(), ada);
    let mut channel = ReplicationChannel::new(ada);
    for sync in server.collect_sync(&mut channel) {
        client.apply_sync(sync, &client_env);
    }
    client.advance(Millis(800), &client_env);
    assert_eq!(
        client.character(ada).and_then(Character::weapon).map(|w| w.state()),
        Some(WeaponState::Idle)
    );
    assert_eq!(magazine(&client, ada), 30);

    client_rig.probe.set(bob, 100.0);
    server_rig.probe.set(bob, 100.0);
    client.start_fire(ada, &client_env).expect("trigger");
    client.stop_fire(ada, &client_env).expect("release");
    assert_eq!(magazine(&client, ada), 29);
    assert_eq!(client_rig.effects.count("weapon.impact"), 1);

    for envelope in client.drain_outbox() {
        server.handle_intent(ada, envelope, &server_env).ok();
    }
    assert_eq!(magazine(&server, ada), 29);
    assert!((server.character(bob).map_or(0.0, Character::health) - 75.0).abs() < 1.0e-3);
}

#[test]
fn zero_quantity_requests_from_clients_change_nothing() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = dedicated(GameConfig::default());
    let ada = spawn(&mut world, "Ada", &env);
    let crate_id = world
        .spawn_container("Crate", Transform::IDENTITY, &env)
        .expect("container");
    world.give_kind(crate_id, FOOD, 2, &env);
    world.give_kind(ada, FOOD, 3, &env);

    let drop = IntentEnvelope {
        actor: ada,
        intent: Intent::DropItem {
            item: stack(&world, ada, FOOD),
            quantity: 0,
        },
    };
    assert_eq!(world.handle_intent(ada, drop, &env), Ok(()));
    assert_eq!(held(&world, ada, FOOD), 3);
    assert_eq!(world.pickups().count(), 0);

    world.set_loot_source(ada, Some(crate_id), &env).expect("open");
    let loot = IntentEnvelope {
        actor: ada,
        intent: Intent::LootItem {
            kind: FOOD,
            quantity: 0,
        },
    };
    assert_eq!(world.handle_intent(ada, loot, &env), Ok(()));
    assert_eq!(world.loot_item(ada, FOOD, 0, &env).map(|r| r.granted), Ok(0));
    assert_eq!(held(&world, crate_id, FOOD), 2);
    assert_eq!(held(&world, ada, FOOD), 3);
}

#[test]
fn destroyed_character_frees_an_exclusive_target() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = dedicated(GameConfig::default());
    let ada = spawn(&mut world, "Ada", &env);
    let bob = spawn(&mut world, "Bob", &env);
    let chest = EntityId(50);
    world.insert_container(
        chest,
        "Chest".to_owned(),
        Transform::IDENTITY,
        5,
        50.0,
        Some(
            Interactable::new(InteractKind::Loot, "Chest", "Open")
                .exclusive()
                .with_time(Millis(1000)),
        ),
    );
    rig.probe.set(chest, 50.0);

    world.begin_interact(ada, &env).expect("ada holds the chest");
    assert_eq!(
        world.begin_interact(bob, &env),
        Err(Rejection::InvalidTarget(TargetIssue::Unavailable))
    );

    assert!(world.destroy_entity(ada, &env));
    assert!(world.container(chest).is_some_and(|c| c.interactable().interactors().is_empty()));
    world.begin_interact(bob, &env).expect("chest is free again");
}

#[test]
fn releasing_a_player_lets_go_of_trigger_hold_and_loot() {
    let rig = Rig::new();
    let env = rig.env();
    let mut world = dedicated(GameConfig::default());
    let ada = spawn(&mut world, "Ada", &env);
    world.give_kind(ada, AMMO, 60, &env);
    world.give_kind(ada, RIFLE, 1, &env);
    world.advance(Millis(300), &env);
    world.start_reload(ada, &env).expect("reload");
    world.advance(Millis(800), &env);

    let crate_id = world
        .spawn_container("Crate", Transform::IDENTITY, &env)
        .expect("container");
    world.set_loot_source(ada, Some(crate_id), &env).expect("open");
    let food = catalog()
        .definition(FOOD)
        .expect("food")
        .instantiate(ItemId::new(EntityId(0), 0), 1);
    let pickup = world
        .spawn_pickup(food, Transform::IDENTITY, &env)
        .expect("pickup");
    rig.probe.set(pickup, 50.0);
    world.begin_interact(ada, &env).expect("hold");

    world.start_fire(ada, &env).expect("trigger");
    let shot = IntentEnvelope {
        actor: ada,
        intent: Intent::HandleFiring {
            aim: glam::Vec3::X,
        },
    };
    world.handle_intent(ada, shot, &env).expect("shot");
    let weapon = world.character(ada).and_then(Character::weapon).expect("rifle");
    assert_eq!(weapon.state(), WeaponState::Firing);
    assert_eq!(weapon.burst_counter(), 1);

    world.release_player(ada, &env);

    let character = world.character(ada).expect("ada");
    let weapon = character.weapon().expect("rifle");
    assert_eq!(weapon.state(), WeaponState::Idle);
    assert_eq!(weapon.burst_counter(), 0);
    assert_eq!(character.loot_source(), None);
    assert_eq!(world.interaction_progress(ada), None);
    assert!(world.pickup(pickup).is_some_and(|p| p.interactable().interactors().is_empty()));

    world.advance(Millis(3000), &env);
    assert!(world.pickup(pickup).is_some(), "the hold never completes");
}
