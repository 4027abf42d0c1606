//! High-level session orchestrator.
//!
//! The session owns the authority worker, wires up command/event channels, and
//! exposes a builder-based API for hosts to drive the match.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use survival_core::{GameConfig, ItemCatalog, World};

use crate::api::handle::Shared;
use crate::api::{Result, RuntimeError, SessionHandle};
use crate::arena::Arena;
use crate::events::{Event, EventBus, Topic};
use crate::services::Services;
use crate::workers::{AuthorityWorker, Command};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub game_config: GameConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// When set, the authority advances its clock by this much on a fixed-rate
    /// tick. When unset, time only moves through [`SessionHandle::advance`].
    pub tick_interval: Option<Duration>,
    /// First entity id handed out by the arena.
    pub first_entity_id: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game_config: GameConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
            tick_interval: None,
            first_entity_id: 1,
        }
    }
}

/// A running match: one authoritative world plus its worker.
///
/// [`SessionHandle`] provides a cloneable façade for clients.
pub struct Session {
    handle: SessionHandle,
    worker_handle: JoinHandle<()>,
}

impl Session {
    /// Create a new session builder
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Get a cloneable handle to this session
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Shutdown the session gracefully
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await?;
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Session`] with flexible configuration.
pub struct SessionBuilder {
    config: RuntimeConfig,
    catalog: Option<Arc<dyn ItemCatalog>>,
}

impl SessionBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            catalog: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn game_config(mut self, game_config: GameConfig) -> Self {
        self.config.game_config = game_config;
        self
    }

    /// Set the required item catalog
    pub fn catalog(mut self, catalog: impl ItemCatalog + 'static) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    pub fn shared_catalog(mut self, catalog: Arc<dyn ItemCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Advance the authority on a fixed-rate tick
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.config.tick_interval = Some(interval);
        self
    }

    /// Build the session and start its authority worker
    pub async fn build(self) -> Result<Session> {
        let catalog = self.catalog.ok_or(RuntimeError::MissingCatalog)?;

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let arena = Arc::new(Arena::new(self.config.first_entity_id).with_events(event_bus.clone()));

        let shared = Arc::new(Shared {
            config: self.config.game_config.clone(),
            catalog: catalog.clone(),
            arena: arena.clone(),
        });
        let handle = SessionHandle::new(command_tx, event_bus.clone(), shared);

        let world = World::authority(self.config.game_config, catalog);
        let worker = AuthorityWorker::new(
            world,
            Services::authority(arena),
            command_rx,
            event_bus,
            self.config.tick_interval,
        );
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Session {
            handle,
            worker_handle,
        })
    }
}
