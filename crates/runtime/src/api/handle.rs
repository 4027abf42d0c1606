//! Cloneable façade for issuing commands to the session.
//!
//! [`SessionHandle`] hides channel plumbing and offers async helpers for
//! populating the world, connecting players, stepping the clock, or streaming
//! events from specific topics.
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use survival_core::{
    AddResult, EntityId, GameConfig, Intent, ItemCatalog, ItemKind, Millis, Transform,
    WorldSnapshot,
};

use super::errors::{Result, RuntimeError};
use super::replica::ObserverReplica;
use crate::arena::Arena;
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Static data every replica of the session is built from.
pub(crate) struct Shared {
    pub(crate) config: GameConfig,
    pub(crate) catalog: Arc<dyn ItemCatalog>,
    pub(crate) arena: Arc<Arena>,
}

/// Client-facing handle to interact with the session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    shared: Arc<Shared>,
}

impl SessionHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus, shared: Arc<Shared>) -> Self {
        Self {
            command_tx,
            event_bus,
            shared,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    pub async fn spawn_character(&self, name: impl Into<String>, view: Transform) -> Result<EntityId> {
        let name = name.into();
        self.request(|reply| Command::SpawnCharacter { name, view, reply })
            .await?
    }

    pub async fn spawn_container(&self, name: impl Into<String>, transform: Transform) -> Result<EntityId> {
        let name = name.into();
        self.request(|reply| Command::SpawnContainer {
            name,
            transform,
            reply,
        })
        .await?
    }

    /// Places `quantity` units of a catalog item in the world as a pickup.
    pub async fn spawn_pickup(&self, kind: ItemKind, quantity: u32, transform: Transform) -> Result<EntityId> {
        self.request(|reply| Command::SpawnPickup {
            kind,
            quantity,
            transform,
            reply,
        })
        .await?
    }

    /// Grants catalog items to a character or a container.
    pub async fn give(&self, owner: EntityId, kind: ItemKind, quantity: u32) -> Result<AddResult> {
        self.request(|reply| Command::Give {
            owner,
            kind,
            quantity,
            reply,
        })
        .await
    }

    /// Runs `intent` on the authority for an actor that has no replica, such
    /// as a bot.
    pub async fn act(&self, actor: EntityId, intent: Intent) -> Result<()> {
        self.request(|reply| Command::Act {
            actor,
            intent,
            reply,
        })
        .await?
    }

    /// Attaches a replica for `player`. The first state frame with everything
    /// the player can see is already queued when this returns.
    pub async fn connect(&self, player: EntityId) -> Result<ObserverReplica> {
        let connection = self
            .request(|reply| Command::Connect { player, reply })
            .await??;
        Ok(ObserverReplica::new(
            player,
            &self.shared,
            self.clone(),
            connection.downlink,
            connection.now,
        ))
    }

    /// Moves the authority clock forward by `dt` and returns the new time.
    pub async fn advance(&self, dt: Millis) -> Result<Millis> {
        self.request(|reply| Command::Advance { dt, reply }).await
    }

    /// Query the current authoritative state (read-only summary)
    pub async fn snapshot(&self) -> Result<WorldSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Stops the authority worker. Later requests fail with
    /// [`RuntimeError::CommandChannelClosed`].
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    pub(crate) async fn send_intents(&self, sender: EntityId, frame: Vec<u8>) -> Result<()> {
        self.command_tx
            .send(Command::Intents { sender, frame })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Intent` - Intents accepted or rejected by the authority
    /// - `Topic::Sync` - State frames pushed to observers
    /// - `Topic::Lifecycle` - Spawns, despawns, and player connections
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    pub fn arena(&self) -> &Arena {
        &self.shared.arena
    }

    pub fn config(&self) -> &GameConfig {
        &self.shared.config
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
