//! The scripted match the server plays.
//!
//! Ada is a connected player driving an observer replica; Bob is a bot whose
//! intents run straight on the authority.
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use glam::Vec3;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, warn};

use survival_core::{Character, EntityId, Intent, Item, ItemId, ItemKind, Millis, Transform, WorldSnapshot};
use survival_runtime::{Event, IntentEvent, ObserverReplica, SessionHandle, Topic};

const RIFLE_AMMO: ItemKind = ItemKind(1);
const PISTOL_AMMO: ItemKind = ItemKind(2);
const RIFLE: ItemKind = ItemKind(10);
const PISTOL: ItemKind = ItemKind(11);
const FOOD: ItemKind = ItemKind(20);
const HELMET: ItemKind = ItemKind(30);
const GRENADE: ItemKind = ItemKind(40);

#[derive(Debug, Serialize)]
pub struct MatchReport {
    pub final_state: WorldSnapshot,
    pub notices: Vec<String>,
    pub intents_accepted: usize,
    pub intents_rejected: usize,
}

struct Match {
    handle: SessionHandle,
    player: ObserverReplica,
    step: Millis,
    intents: broadcast::Receiver<Event>,
    report_notices: Vec<String>,
    accepted: usize,
    rejected: usize,
}

impl Match {
    fn me(&self) -> EntityId {
        self.player.player()
    }

    fn character(&self) -> Result<&Character> {
        self.player
            .world()
            .character(self.me())
            .context("player character missing from replica")
    }

    fn stack(&self, kind: ItemKind) -> Result<ItemId> {
        self.character()?
            .inventory()
            .find(kind)
            .map(Item::id)
            .with_context(|| format!("no {kind} in inventory"))
    }

    /// Runs the authority and the replica forward together for `duration`.
    async fn run_for(&mut self, duration: Millis) -> Result<()> {
        let mut elapsed = Millis::ZERO;
        while elapsed < duration {
            self.handle.advance(self.step).await?;
            self.player.pump()?;
            self.player.advance(self.step);
            self.player.flush().await?;
            elapsed = elapsed + self.step;
        }
        self.settle().await
    }

    /// Delivers queued intents and applies the authority's answer.
    async fn settle(&mut self) -> Result<()> {
        self.player.flush().await?;
        // Any round trip is ordered after the intents just sent.
        self.handle.snapshot().await?;
        self.player.pump()?;
        for notice in self.player.take_notices() {
            info!(target: "server::script", %notice, "player notice");
            self.report_notices.push(notice);
        }
        self.count_intents();
        Ok(())
    }

    fn count_intents(&mut self) {
        loop {
            match self.intents.try_recv() {
                Ok(Event::Intent(IntentEvent::Accepted { .. })) => self.accepted += 1,
                Ok(Event::Intent(IntentEvent::Rejected {
                    sender,
                    intent,
                    reason,
                    ..
                })) => {
                    warn!(target: "server::script", %sender, %intent, %reason, "intent rejected");
                    self.rejected += 1;
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(target: "server::script", missed, "intent events lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    /// Points the player at `forward` from `location` and lets the focus
    /// probe run.
    async fn face(&mut self, location: Vec3, forward: Vec3) -> Result<()> {
        self.player.look(Transform::new(location, forward))?;
        self.run_for(self.step).await
    }

    /// Opens whatever the player is focused on as a loot source.
    async fn open_focused(&mut self, source: EntityId) -> Result<()> {
        self.player.begin_interact()?;
        self.settle().await?;
        ensure!(
            self.character()?.loot_source() == Some(source),
            "{source} did not open for looting"
        );
        Ok(())
    }

    async fn close_loot(&mut self) -> Result<()> {
        self.player.set_loot_source(None)?;
        self.player.stop_interact()?;
        self.settle().await
    }
}

pub async fn play(handle: SessionHandle, tick: Duration) -> Result<MatchReport> {
    let step = Millis(u64::try_from(tick.as_millis()).unwrap_or(50).max(1));
    let intents = handle.subscribe(Topic::Intent);

    let ada = handle
        .spawn_character("Ada", Transform::new(Vec3::ZERO, Vec3::X))
        .await?;
    let bob = handle
        .spawn_character("Bob", Transform::new(Vec3::new(400.0, 0.0, 0.0), Vec3::NEG_X))
        .await?;
    let supplies = handle
        .spawn_container("Supply Crate", Transform::new(Vec3::new(0.0, 150.0, 0.0), Vec3::NEG_Y))
        .await?;

    handle.give(ada, RIFLE_AMMO, 90).await?;
    handle.give(ada, RIFLE, 1).await?;
    handle.give(bob, PISTOL_AMMO, 24).await?;
    handle.give(bob, PISTOL, 1).await?;
    handle.give(bob, FOOD, 2).await?;
    for (kind, quantity) in [(FOOD, 3), (HELMET, 1), (GRENADE, 2)] {
        handle.give(supplies, kind, quantity).await?;
    }

    let player = handle.connect(ada).await?;
    let mut game = Match {
        handle: handle.clone(),
        player,
        step,
        intents,
        report_notices: Vec::new(),
        accepted: 0,
        rejected: 0,
    };

    // Both weapons finish equipping; the player's rifle reloads on its own.
    game.run_for(Millis(3000)).await?;
    handle.act(bob, Intent::StartReload).await?;

    info!(target: "server::script", "phase 1: loot the supply crate");
    game.face(Vec3::ZERO, Vec3::Y).await?;
    game.open_focused(supplies).await?;
    for (kind, quantity) in [(FOOD, 2), (HELMET, 1), (GRENADE, 1)] {
        game.player.loot(kind, quantity)?;
    }
    game.settle().await?;
    game.close_loot().await?;

    info!(target: "server::script", "phase 2: firefight");
    game.face(Vec3::ZERO, Vec3::X).await?;
    game.run_for(Millis(1300)).await?;
    for intent in [
        Intent::StartFire,
        Intent::HandleFiring { aim: Vec3::NEG_X },
        Intent::StopFire,
    ] {
        handle.act(bob, intent).await?;
    }
    game.player.start_fire()?;
    game.run_for(Millis(400)).await?;
    game.player.stop_fire()?;
    game.settle().await?;
    let bob_alive = game
        .player
        .world()
        .character(bob)
        .is_some_and(Character::is_alive);
    ensure!(!bob_alive, "bob survived the firefight");

    info!(target: "server::script", "phase 3: loot the body");
    game.face(Vec3::new(250.0, 0.0, 0.0), Vec3::X).await?;
    game.open_focused(bob).await?;
    game.player.loot(FOOD, 2)?;
    game.settle().await?;
    game.close_loot().await?;

    info!(target: "server::script", "phase 4: patch up");
    let food = game.stack(FOOD)?;
    game.player.use_item(food)?;
    game.settle().await?;
    let food = game.stack(FOOD)?;
    game.player.drop_item(food, 1)?;
    let helmet = game.stack(HELMET)?;
    game.player.use_item(helmet)?;
    let grenade = game.stack(GRENADE)?;
    game.player.use_item(grenade)?;
    game.settle().await?;
    game.player.use_throwable()?;
    game.run_for(Millis(500)).await?;

    let final_state = handle.snapshot().await?;
    info!(
        target: "server::script",
        now = %final_state.now,
        accepted = game.accepted,
        rejected = game.rejected,
        "match finished"
    );
    Ok(MatchReport {
        final_state,
        notices: game.report_notices,
        intents_accepted: game.accepted,
        intents_rejected: game.rejected,
    })
}
