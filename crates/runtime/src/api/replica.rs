//! A player's predicted view of the session.
//!
//! Verbs run against the replica's own observer world first, so timers,
//! effects, and weapon state react immediately. Whatever needs the authority
//! lands in the world's outbox until [`ObserverReplica::flush`] ships it; the
//! authority's answers arrive as state frames applied by
//! [`ObserverReplica::pump`].
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

use survival_core::{AddResult, EntityId, ItemId, ItemKind, Millis, Rejection, Transform, World};

use super::errors::Result;
use super::handle::{SessionHandle, Shared};
use crate::services::Services;
use crate::transport::{self, Downlink, Uplink};

pub struct ObserverReplica {
    player: EntityId,
    world: World,
    services: Services,
    session: SessionHandle,
    downlink: mpsc::UnboundedReceiver<Vec<u8>>,
    connected: bool,
}

impl ObserverReplica {
    pub(crate) fn new(
        player: EntityId,
        shared: &Shared,
        session: SessionHandle,
        downlink: mpsc::UnboundedReceiver<Vec<u8>>,
        now: Millis,
    ) -> Self {
        let services = Services::observer(shared.arena.clone());
        let mut world = World::observer(shared.config.clone(), shared.catalog.clone(), player);
        world.advance(now, &services.env());
        Self {
            player,
            world,
            services,
            session,
            downlink,
            connected: true,
        }
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    /// The predicted world. Read-only: changes go through the verbs below.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn now(&self) -> Millis {
        self.world.now()
    }

    /// False once the authority dropped this replica.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Messages shown to this player since the last call, local and remote.
    pub fn take_notices(&mut self) -> Vec<String> {
        self.services
            .notices
            .drain()
            .into_iter()
            .filter(|(recipient, _)| *recipient == self.player)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn look(&mut self, view: Transform) -> std::result::Result<(), Rejection> {
        self.world.set_view(self.player, view)
    }

    pub fn start_fire(&mut self) -> std::result::Result<(), Rejection> {
        self.world.start_fire(self.player, &self.services.env())
    }

    pub fn stop_fire(&mut self) -> std::result::Result<(), Rejection> {
        self.world.stop_fire(self.player, &self.services.env())
    }

    pub fn reload(&mut self) -> std::result::Result<(), Rejection> {
        self.world.start_reload(self.player, &self.services.env())
    }

    pub fn begin_interact(&mut self) -> std::result::Result<(), Rejection> {
        self.world.begin_interact(self.player, &self.services.env())
    }

    pub fn stop_interact(&mut self) -> std::result::Result<(), Rejection> {
        self.world.stop_interact(self.player, &self.services.env())
    }

    /// Hold progress of the current interaction in `[0, 1]`.
    pub fn interaction_progress(&self) -> Option<f32> {
        self.world.interaction_progress(self.player)
    }

    pub fn set_loot_source(&mut self, source: Option<EntityId>) -> std::result::Result<(), Rejection> {
        self.world
            .set_loot_source(self.player, source, &self.services.env())
    }

    pub fn loot(&mut self, kind: ItemKind, quantity: u32) -> std::result::Result<AddResult, Rejection> {
        self.world
            .loot_item(self.player, kind, quantity, &self.services.env())
    }

    pub fn use_item(&mut self, item: ItemId) -> std::result::Result<(), Rejection> {
        self.world.use_item(self.player, item, &self.services.env())
    }

    pub fn drop_item(&mut self, item: ItemId, quantity: u32) -> std::result::Result<(), Rejection> {
        self.world
            .drop_item(self.player, item, quantity, &self.services.env())
    }

    pub fn use_throwable(&mut self) -> std::result::Result<(), Rejection> {
        self.world.use_throwable(self.player, &self.services.env())
    }

    /// Runs local timers and focus probes up to `now + dt`.
    pub fn advance(&mut self, dt: Millis) -> Millis {
        let now = self.world.now() + dt;
        self.world.advance(now, &self.services.env());
        now
    }

    /// Sends every queued intent to the authority in one frame. Returns how
    /// many were sent.
    pub async fn flush(&mut self) -> Result<usize> {
        let intents = self.world.drain_outbox();
        if intents.is_empty() {
            return Ok(0);
        }
        let count = intents.len();
        let frame = transport::encode(&Uplink { intents })?;
        debug!(target: "runtime::replica", player = %self.player, count, bytes = frame.len(), "flushing intents");
        self.session.send_intents(self.player, frame).await?;
        Ok(count)
    }

    /// Applies every state frame that has arrived. Returns how many sync
    /// messages were applied.
    pub fn pump(&mut self) -> Result<usize> {
        let mut applied = 0;
        loop {
            let bytes = match self.downlink.try_recv() {
                Ok(bytes) => bytes,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.connected {
                        warn!(target: "runtime::replica", player = %self.player, "authority closed the downlink");
                        self.connected = false;
                    }
                    break;
                }
            };
            let frame: Downlink = transport::decode(&bytes)?;
            let env = self.services.env();
            for sync in frame.syncs {
                self.world.apply_sync(sync, &env);
                applied += 1;
            }
            for notice in frame.notices {
                info!(target: "runtime::replica", player = %self.player, notice, "notice");
                self.services.notices.post(self.player, notice);
            }
        }
        Ok(applied)
    }
}

impl std::fmt::Debug for ObserverReplica {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverReplica")
            .field("player", &self.player)
            .field("now", &self.world.now())
            .field("connected", &self.connected)
            .finish()
    }
}
