use super::*;
use crate::item::ItemKind;

const OWNER: EntityId = EntityId(1);

fn spec() -> WeaponSpec {
    WeaponSpec {
        magazine_capacity: 30,
        time_between_shots: Millis(100),
        reload_duration: Millis(500),
        equip_duration: Millis(300),
        ammo_kind: ItemKind(2),
        damage: 25.0,
        range: 5000.0,
    }
}

fn host(reserve: u32) -> WeaponContext {
    WeaponContext {
        now: Millis(0),
        authority: true,
        local: true,
        owner_alive: true,
        reserve,
        transfer_lead: Millis(100),
        min_transfer: Millis(100),
        shot_tolerance: Millis(100),
    }
}

fn client(reserve: u32) -> WeaponContext {
    WeaponContext {
        authority: false,
        ..host(reserve)
    }
}

/// Weapon past its equip animation with `magazine` rounds loaded.
fn equipped(magazine: u32) -> Weapon {
    let quiet = WeaponContext {
        local: false,
        ..host(0)
    };
    let mut weapon = Weapon::new(EntityId(50), OWNER, ItemId::new(OWNER, 0), spec())
        .with_magazine(magazine);
    let mut out = Vec::new();
    weapon.equip(&quiet, &mut out);
    weapon.finish_equip(&quiet, &mut out);
    weapon
}

fn count(out: &[WeaponEffect], effect: WeaponEffect) -> usize {
    out.iter().filter(|e| **e == effect).count()
}

#[test]
fn reload_refills_magazine_before_animation_ends() {
    let mut weapon = equipped(0);
    let mut out = Vec::new();

    weapon.start_reload(&host(60), &mut out).unwrap();

    assert_eq!(weapon.state(), WeaponState::Reloading);
    assert!(out.contains(&WeaponEffect::Schedule {
        purpose: TimerPurpose::ReloadFinish,
        delay: Millis(500)
    }));
    assert!(out.contains(&WeaponEffect::Schedule {
        purpose: TimerPurpose::ReloadTransfer,
        delay: Millis(400)
    }));

    assert_eq!(weapon.transfer_ammo(&host(60), &mut out), 30);
    assert_eq!(weapon.ammo_in_magazine(), 30);
    assert_eq!(weapon.state(), WeaponState::Reloading);

    weapon.finish_reload(&host(30), &mut out);
    assert_eq!(weapon.state(), WeaponState::Idle);
    assert!(out.contains(&WeaponEffect::TransferAmmo(30)));
}

#[test]
fn reload_is_refused_with_distinct_reasons() {
    let mut full = equipped(30);
    let mut dry = equipped(10);
    let mut out = Vec::new();

    assert_eq!(
        full.start_reload(&host(60), &mut out),
        Err(Rejection::NotReady(NotReadyReason::MagazineFull))
    );
    assert_eq!(
        dry.start_reload(&host(0), &mut out),
        Err(Rejection::NotReady(NotReadyReason::NoReserveAmmo))
    );
    assert_eq!(full.state(), WeaponState::Idle);
    assert_eq!(dry.state(), WeaponState::Idle);
    assert_eq!(
        out,
        vec![
            WeaponEffect::Notify(Rejection::NotReady(NotReadyReason::MagazineFull)),
            WeaponEffect::Notify(Rejection::NotReady(NotReadyReason::NoReserveAmmo)),
        ]
    );
}

#[test]
fn empty_trigger_press_cues_out_of_ammo_once() {
    let mut weapon = equipped(1);
    let mut out = Vec::new();
    let ctx = host(0);

    weapon.start_fire(&ctx, &mut out).unwrap();
    assert_eq!(weapon.ammo_in_magazine(), 0);
    assert_eq!(count(&out, WeaponEffect::Shot { authoritative: true }), 1);
    weapon.stop_fire(&ctx, &mut out);
    out.clear();

    let again = weapon.start_fire(&WeaponContext { now: Millis(500), ..ctx }, &mut out);

    assert_eq!(again, Err(Rejection::NotReady(NotReadyReason::OutOfAmmo)));
    assert!(!weapon.can_fire(&ctx));
    assert_eq!(weapon.state(), WeaponState::Idle);
    assert_eq!(count(&out, WeaponEffect::Cue(WeaponCue::OutOfAmmo)), 1);
    assert_eq!(
        count(
            &out,
            WeaponEffect::Notify(Rejection::NotReady(NotReadyReason::OutOfAmmo))
        ),
        1
    );
}

#[test]
fn held_trigger_on_empty_magazine_does_not_repeat_cue() {
    let mut weapon = equipped(1);
    let mut out = Vec::new();

    weapon.start_fire(&host(0), &mut out).unwrap();
    for tick in 1..5 {
        let ctx = WeaponContext {
            now: Millis(tick * 100),
            ..host(0)
        };
        weapon.refire(&ctx, &mut out);
    }

    assert_eq!(count(&out, WeaponEffect::Cue(WeaponCue::OutOfAmmo)), 0);
    assert_eq!(weapon.burst_counter(), 0);
}

#[test]
fn held_trigger_fires_on_refire_timer() {
    let mut weapon = equipped(5);
    let mut out = Vec::new();

    weapon.start_fire(&host(0), &mut out).unwrap();
    assert_eq!(weapon.state(), WeaponState::Firing);
    assert!(out.contains(&WeaponEffect::Schedule {
        purpose: TimerPurpose::Refire,
        delay: Millis(100)
    }));

    weapon.refire(&WeaponContext { now: Millis(100), ..host(0) }, &mut out);
    weapon.refire(&WeaponContext { now: Millis(200), ..host(0) }, &mut out);

    assert_eq!(weapon.ammo_in_magazine(), 2);
    assert_eq!(weapon.burst_counter(), 3);

    weapon.stop_fire(&host(0), &mut out);
    assert_eq!(weapon.burst_counter(), 0);
    assert!(out.contains(&WeaponEffect::Cancel(TimerPurpose::Refire)));
}

#[test]
fn last_round_starts_auto_reload() {
    let mut weapon = equipped(1);
    let mut out = Vec::new();

    weapon.start_fire(&host(60), &mut out).unwrap();

    assert_eq!(weapon.ammo_in_magazine(), 0);
    assert_eq!(weapon.state(), WeaponState::Reloading);
    assert!(weapon.is_pending_reload());
}

#[test]
fn firing_while_reloading_stays_reloading() {
    let mut weapon = equipped(10);
    let mut out = Vec::new();
    weapon.start_reload(&host(60), &mut out).unwrap();
    out.clear();

    let result = weapon.start_fire(&host(60), &mut out);

    assert_eq!(
        result,
        Err(Rejection::NotReady(NotReadyReason::Busy(
            WeaponState::Reloading
        )))
    );
    assert_eq!(weapon.state(), WeaponState::Reloading);
    assert_eq!(count(&out, WeaponEffect::Shot { authoritative: true }), 0);

    // Held trigger resumes once the reload completes.
    weapon.finish_reload(&host(60), &mut out);
    assert_eq!(weapon.state(), WeaponState::Firing);
}

#[test]
fn early_repress_waits_for_fire_interval() {
    let mut weapon = equipped(10);
    let mut out = Vec::new();
    weapon.start_fire(&host(0), &mut out).unwrap();
    weapon.stop_fire(&host(0), &mut out);
    out.clear();

    weapon
        .start_fire(&WeaponContext { now: Millis(40), ..host(0) }, &mut out)
        .unwrap();

    assert_eq!(count(&out, WeaponEffect::Shot { authoritative: true }), 0);
    assert!(out.contains(&WeaponEffect::Schedule {
        purpose: TimerPurpose::Refire,
        delay: Millis(60)
    }));
}

#[test]
fn owning_client_predicts_and_forwards() {
    let mut weapon = equipped(3);
    let mut out = Vec::new();

    weapon.start_fire(&client(0), &mut out).unwrap();

    assert_eq!(weapon.ammo_in_magazine(), 2);
    assert_eq!(
        &out[..3],
        &[
            WeaponEffect::Forward(WeaponIntent::StartFire),
            WeaponEffect::Shot {
                authoritative: false
            },
            WeaponEffect::Forward(WeaponIntent::HandleFiring),
        ]
    );
}

#[test]
fn authority_rejects_shots_it_cannot_confirm() {
    let mut weapon = equipped(1);
    let mut out = Vec::new();
    let remote = WeaponContext {
        local: false,
        ..host(0)
    };

    weapon.start_fire(&remote, &mut out).unwrap();
    weapon.confirm_shot(&remote, &mut out).unwrap();
    assert_eq!(weapon.burst_counter(), 1);

    assert_eq!(
        weapon.confirm_shot(&remote, &mut out),
        Err(Rejection::NotReady(NotReadyReason::OutOfAmmo))
    );
    assert_eq!(count(&out, WeaponEffect::Shot { authoritative: true }), 1);
}

#[test]
fn authority_paces_reported_shots_to_the_fire_rate() {
    let mut weapon = equipped(10);
    let mut out = Vec::new();
    let at = |now: u64| WeaponContext {
        local: false,
        now: Millis(now),
        ..host(0)
    };
    weapon.start_fire(&at(0), &mut out).unwrap();

    // One interval of tolerance lets a second shot from the same batch through.
    weapon.confirm_shot(&at(0), &mut out).unwrap();
    weapon.confirm_shot(&at(0), &mut out).unwrap();
    assert_eq!(
        weapon.confirm_shot(&at(0), &mut out),
        Err(Rejection::NotReady(NotReadyReason::FireRate))
    );

    weapon.confirm_shot(&at(100), &mut out).unwrap();
    assert_eq!(
        weapon.confirm_shot(&at(100), &mut out),
        Err(Rejection::NotReady(NotReadyReason::FireRate))
    );
    weapon.confirm_shot(&at(300), &mut out).unwrap();

    assert_eq!(weapon.ammo_in_magazine(), 6);
    assert_eq!(count(&out, WeaponEffect::Shot { authoritative: true }), 4);
}

#[test]
fn unequip_returns_magazine_and_cancels_timers() {
    let mut weapon = equipped(12);
    let mut out = Vec::new();
    weapon.start_reload(&host(60), &mut out).unwrap();
    out.clear();

    let returned = weapon.unequip(&host(60), &mut out);

    assert_eq!(returned, 12);
    assert_eq!(weapon.ammo_in_magazine(), 0);
    assert_eq!(weapon.state(), WeaponState::Idle);
    assert!(!weapon.is_pending_reload());
    for purpose in [
        TimerPurpose::ReloadFinish,
        TimerPurpose::ReloadTransfer,
        TimerPurpose::EquipFinish,
        TimerPurpose::Refire,
    ] {
        assert!(out.contains(&WeaponEffect::Cancel(purpose)));
    }
    assert!(out.contains(&WeaponEffect::ReturnAmmo(12)));
}

#[test]
fn equip_finishes_into_auto_reload() {
    let mut weapon = Weapon::new(EntityId(50), OWNER, ItemId::new(OWNER, 0), spec());
    let mut out = Vec::new();

    weapon.equip(&host(60), &mut out);
    assert_eq!(weapon.state(), WeaponState::Equipping);
    assert!(!weapon.can_fire(&host(60)));

    weapon.finish_equip(&host(60), &mut out);
    assert!(weapon.is_equipped());
    assert_eq!(weapon.state(), WeaponState::Reloading);
}

#[test]
fn observers_mirror_burst_and_reload() {
    let mut weapon = Weapon::new(EntityId(50), OWNER, ItemId::new(OWNER, 0), spec());
    let mut out = Vec::new();

    weapon.apply_burst_counter(3, &mut out);
    weapon.apply_burst_counter(0, &mut out);
    weapon.apply_pending_reload(true, &mut out);
    weapon.apply_pending_reload(true, &mut out);

    assert_eq!(
        out,
        vec![
            WeaponEffect::Cue(WeaponCue::Fire),
            WeaponEffect::Cue(WeaponCue::FireStop),
            WeaponEffect::Cue(WeaponCue::Reload),
        ]
    );
    assert_eq!(weapon.state(), WeaponState::Reloading);
}
