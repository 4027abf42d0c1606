//! Authority worker that owns the authoritative [`survival_core::World`].
//!
//! Receives commands from [`SessionHandle`](crate::SessionHandle) and intent
//! frames from observer replicas over the same ordered channel, applies them,
//! and pushes state-sync frames to every connected observer after each step.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace, warn};

use survival_core::{
    AddResult, EntityId, GameError, Intent, IntentEnvelope, ItemCatalog as _, ItemId, ItemKind,
    Millis, Rejection, ReplicationChannel, TargetIssue, Transform, World, WorldSnapshot,
};

use crate::api::{Result, RuntimeError};
use crate::events::{Event, EventBus, IntentEvent, LifecycleEvent, SyncEvent};
use crate::services::Services;
use crate::transport::{self, Downlink, Uplink};

/// Commands that can be sent to the authority worker
pub(crate) enum Command {
    SpawnCharacter {
        name: String,
        view: Transform,
        reply: oneshot::Sender<Result<EntityId>>,
    },
    SpawnContainer {
        name: String,
        transform: Transform,
        reply: oneshot::Sender<Result<EntityId>>,
    },
    SpawnPickup {
        kind: ItemKind,
        quantity: u32,
        transform: Transform,
        reply: oneshot::Sender<Result<EntityId>>,
    },
    /// Grants catalog items to a character or container.
    Give {
        owner: EntityId,
        kind: ItemKind,
        quantity: u32,
        reply: oneshot::Sender<AddResult>,
    },
    /// Runs an intent directly on the authority for an actor without a replica.
    Act {
        actor: EntityId,
        intent: Intent,
        reply: oneshot::Sender<Result<()>>,
    },
    Connect {
        player: EntityId,
        reply: oneshot::Sender<Result<Connection>>,
    },
    /// An encoded [`Uplink`] from the replica of `sender`.
    Intents { sender: EntityId, frame: Vec<u8> },
    Advance {
        dt: Millis,
        reply: oneshot::Sender<Millis>,
    },
    Snapshot {
        reply: oneshot::Sender<WorldSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// What a newly connected observer needs to start its replica.
pub(crate) struct Connection {
    pub(crate) downlink: mpsc::UnboundedReceiver<Vec<u8>>,
    pub(crate) now: Millis,
}

struct ObserverLink {
    channel: ReplicationChannel,
    downlink: mpsc::UnboundedSender<Vec<u8>>,
}

/// Background task that processes gameplay commands.
pub(crate) struct AuthorityWorker {
    world: World,
    services: Services,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    observers: BTreeMap<EntityId, ObserverLink>,
    tick: Option<Duration>,
}

impl AuthorityWorker {
    pub(crate) fn new(
        world: World,
        services: Services,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        tick: Option<Duration>,
    ) -> Self {
        info!(target: "runtime::authority", role = %world.role(), ?tick, "authority worker initialized");
        Self {
            world,
            services,
            command_rx,
            event_bus,
            observers: BTreeMap::new(),
            tick,
        }
    }

    /// Main worker loop.
    pub(crate) async fn run(mut self) {
        let mut ticker = self.tick.map(|period| {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval
        });
        let step = self.tick.map_or(Millis::ZERO, |period| {
            Millis(u64::try_from(period.as_millis()).unwrap_or(u64::MAX))
        });

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        info!(target: "runtime::authority", now = %self.world.now(), "shutting down");
                        if reply.send(()).is_err() {
                            debug!(target: "runtime::authority", "Shutdown reply channel closed (caller dropped)");
                        }
                        break;
                    }
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                _ = async {
                    match ticker.as_mut() {
                        Some(interval) => interval.tick().await,
                        None => std::future::pending().await,
                    }
                } => {
                    self.advance(step);
                }
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SpawnCharacter { name, view, reply } => {
                let result = self
                    .world
                    .spawn_character(name, view, &self.services.env())
                    .map_err(RuntimeError::from);
                self.replicate();
                send(reply, result, "SpawnCharacter");
            }
            Command::SpawnContainer {
                name,
                transform,
                reply,
            } => {
                let result = self
                    .world
                    .spawn_container(name, transform, &self.services.env())
                    .map_err(RuntimeError::from);
                self.replicate();
                send(reply, result, "SpawnContainer");
            }
            Command::SpawnPickup {
                kind,
                quantity,
                transform,
                reply,
            } => {
                let result = self.spawn_pickup(kind, quantity, transform);
                self.replicate();
                send(reply, result, "SpawnPickup");
            }
            Command::Give {
                owner,
                kind,
                quantity,
                reply,
            } => {
                let result = self
                    .world
                    .give_kind(owner, kind, quantity, &self.services.env());
                debug!(target: "runtime::authority", %owner, %kind, requested = quantity, granted = result.granted, "give");
                self.replicate();
                send(reply, result, "Give");
            }
            Command::Act {
                actor,
                intent,
                reply,
            } => {
                let result = self.apply_intent(actor, IntentEnvelope { actor, intent });
                self.replicate();
                send(reply, result, "Act");
            }
            Command::Connect { player, reply } => {
                let result = self.connect(player);
                self.replicate();
                send(reply, result, "Connect");
            }
            Command::Intents { sender, frame } => {
                self.receive_intents(sender, &frame);
                self.replicate();
            }
            Command::Advance { dt, reply } => {
                let now = self.advance(dt);
                send(reply, now, "Advance");
            }
            Command::Snapshot { reply } => {
                send(reply, self.world.snapshot(), "Snapshot");
            }
            Command::Shutdown { .. } => unreachable!("shutdown is handled by the run loop"),
        }
    }

    fn advance(&mut self, dt: Millis) -> Millis {
        let now = self.world.now() + dt;
        self.world.advance(now, &self.services.env());
        trace!(target: "runtime::authority", %now, "advanced");
        self.replicate();
        now
    }

    fn spawn_pickup(&mut self, kind: ItemKind, quantity: u32, transform: Transform) -> Result<EntityId> {
        let item = self
            .world
            .catalog()
            .definition(kind)
            .map(|definition| definition.instantiate(ItemId::new(EntityId::default(), 0), quantity))
            .ok_or(Rejection::InvalidTarget(TargetIssue::ItemMissing))?;
        Ok(self.world.spawn_pickup(item, transform, &self.services.env())?)
    }

    fn connect(&mut self, player: EntityId) -> Result<Connection> {
        if self.world.character(player).is_none() {
            return Err(RuntimeError::UnknownPlayer { player });
        }
        if self.observers.contains_key(&player) {
            return Err(RuntimeError::AlreadyConnected { player });
        }

        let (downlink, rx) = mpsc::unbounded_channel();
        self.observers.insert(
            player,
            ObserverLink {
                channel: ReplicationChannel::new(player),
                downlink,
            },
        );
        let now = self.world.now();
        info!(target: "runtime::authority", %player, %now, "player connected");
        self.event_bus
            .publish(Event::Lifecycle(LifecycleEvent::PlayerConnected { player, at: now }));
        Ok(Connection { downlink: rx, now })
    }

    fn receive_intents(&mut self, sender: EntityId, frame: &[u8]) {
        let uplink = match transport::decode::<Uplink>(frame) {
            Ok(uplink) => uplink,
            Err(error) => {
                warn!(target: "runtime::authority", %sender, %error, bytes = frame.len(), "dropping undecodable intent frame");
                return;
            }
        };
        for envelope in uplink.intents {
            // Rejections are already published and logged.
            let _ = self.apply_intent(sender, envelope);
        }
    }

    /// Validates and applies one intent, publishing the outcome.
    fn apply_intent(&mut self, sender: EntityId, envelope: IntentEnvelope) -> Result<()> {
        let intent = envelope.intent.name().to_owned();
        let at = self.world.now();
        match self
            .world
            .handle_intent(sender, envelope, &self.services.env())
        {
            Ok(()) => {
                trace!(target: "runtime::authority", %sender, intent, "intent accepted");
                self.event_bus
                    .publish(Event::Intent(IntentEvent::Accepted { sender, intent, at }));
                Ok(())
            }
            Err(reason) => {
                debug!(
                    target: "runtime::authority",
                    %sender,
                    intent,
                    code = reason.error_code(),
                    %reason,
                    "intent rejected"
                );
                self.event_bus.publish(Event::Intent(IntentEvent::Rejected {
                    sender,
                    intent,
                    reason,
                    at,
                }));
                Err(reason.into())
            }
        }
    }

    /// Moves character bodies to their current view points.
    fn sync_bodies(&self) {
        for character in self.world.characters() {
            self.services
                .arena
                .place(character.id(), character.view().location);
        }
    }

    /// Pushes pending state and notifications to every observer.
    ///
    /// Players whose replica is gone are released and the resulting state is
    /// pushed to everyone still connected.
    fn replicate(&mut self) {
        self.sync_bodies();
        let mut notices = self.services.notices.drain();
        let mut disconnected = Vec::new();

        for (&player, link) in &mut self.observers {
            if link.downlink.is_closed() {
                disconnected.push(player);
                continue;
            }
            let mut frame = Downlink {
                syncs: self.world.collect_sync(&mut link.channel),
                notices: Vec::new(),
            };
            notices.retain(|(recipient, message)| {
                if *recipient == player {
                    frame.notices.push(message.clone());
                    false
                } else {
                    true
                }
            });
            if frame.is_empty() {
                continue;
            }

            let bytes = match transport::encode(&frame) {
                Ok(bytes) => bytes,
                Err(error) => {
                    error!(target: "runtime::authority", %player, %error, "failed to encode state frame");
                    continue;
                }
            };
            let size = bytes.len();
            if link.downlink.send(bytes).is_err() {
                disconnected.push(player);
                continue;
            }
            self.event_bus.publish(Event::Sync(SyncEvent::Pushed {
                player,
                messages: frame.syncs.len(),
                notices: frame.notices.len(),
                bytes: size,
            }));
        }

        for (recipient, message) in notices {
            debug!(target: "runtime::authority", %recipient, message, "notice for a player without a replica");
        }
        if disconnected.is_empty() {
            return;
        }
        for player in disconnected {
            self.disconnect(player);
        }
        self.replicate();
    }

    fn disconnect(&mut self, player: EntityId) {
        if self.observers.remove(&player).is_none() {
            return;
        }
        warn!(target: "runtime::authority", %player, "observer downlink closed; dropping replica");
        self.world.release_player(player, &self.services.env());
        self.event_bus
            .publish(Event::Lifecycle(LifecycleEvent::PlayerDisconnected { player }));
    }
}

fn send<T>(reply: oneshot::Sender<T>, value: T, command: &str) {
    if reply.send(value).is_err() {
        debug!(target: "runtime::authority", command, "reply channel closed (caller dropped)");
    }
}
