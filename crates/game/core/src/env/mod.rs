//! Services the gameplay core calls into.
//!
//! The core never reaches for engine singletons. Spatial queries, presentation
//! effects, player notifications, and entity spawning are narrow traits, and the
//! [`Env`] aggregate bundles whichever implementations the host provides so each
//! operation receives them explicitly.
mod basic;

pub use basic::{
    FixedProbe, LogEffects, NoProbe, RecordingEffects, RecordingNotifications, SequentialSpawner,
};

use glam::Vec3;

use crate::types::{EntityId, Transform};

/// Nearest blocking surface found by a probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    pub entity: EntityId,
    pub point: Vec3,
    pub distance: f32,
}

/// Ray queries against world geometry.
pub trait SpatialProbe: Send + Sync {
    /// Casts from `origin` along `direction` up to `max_distance`, skipping `ignore`.
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        ignore: Option<EntityId>,
    ) -> Option<ProbeHit>;
}

/// Fire-and-forget presentation: animations, sounds, particles.
///
/// Implementations must return immediately.
pub trait EffectSink: Send + Sync {
    fn play(&self, target: EntityId, effect: &str);
}

/// Short messages for one player's screen. Delivery is best-effort.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, recipient: EntityId, message: &str);
}

/// Entity classes the core asks the host to instantiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SpawnKind {
    Pickup,
    Weapon,
    Projectile,
    LootContainer,
    Character,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    #[error("no spawn service available")]
    Unavailable,

    #[error("spawn of {kind} rejected: {reason}")]
    Rejected { kind: SpawnKind, reason: String },
}

/// Creates and removes world entities on the host.
pub trait SpawnService: Send + Sync {
    fn spawn(&self, kind: SpawnKind, at: Transform) -> Result<EntityId, SpawnError>;

    fn destroy(&self, entity: EntityId);
}

/// Aggregates the services an operation may need.
///
/// Missing presentation services are silently skipped; a missing probe finds
/// nothing; a missing spawner fails spawns with [`SpawnError::Unavailable`].
#[derive(Clone, Copy, Default)]
pub struct Env<'a> {
    probe: Option<&'a dyn SpatialProbe>,
    effects: Option<&'a dyn EffectSink>,
    notifications: Option<&'a dyn NotificationSink>,
    spawner: Option<&'a dyn SpawnService>,
}

impl<'a> Env<'a> {
    pub fn new(
        probe: Option<&'a dyn SpatialProbe>,
        effects: Option<&'a dyn EffectSink>,
        notifications: Option<&'a dyn NotificationSink>,
        spawner: Option<&'a dyn SpawnService>,
    ) -> Self {
        Self {
            probe,
            effects,
            notifications,
            spawner,
        }
    }

    pub fn with_all(
        probe: &'a dyn SpatialProbe,
        effects: &'a dyn EffectSink,
        notifications: &'a dyn NotificationSink,
        spawner: &'a dyn SpawnService,
    ) -> Self {
        Self::new(Some(probe), Some(effects), Some(notifications), Some(spawner))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        ignore: Option<EntityId>,
    ) -> Option<ProbeHit> {
        self.probe?.probe(origin, direction, max_distance, ignore)
    }

    pub fn play(&self, target: EntityId, effect: &str) {
        if let Some(effects) = self.effects {
            effects.play(target, effect);
        }
    }

    pub fn notify(&self, recipient: EntityId, message: &str) {
        if let Some(notifications) = self.notifications {
            notifications.notify(recipient, message);
        }
    }

    pub fn spawn(&self, kind: SpawnKind, at: Transform) -> Result<EntityId, SpawnError> {
        self.spawner.ok_or(SpawnError::Unavailable)?.spawn(kind, at)
    }

    pub fn destroy(&self, entity: EntityId) {
        if let Some(spawner) = self.spawner {
            spawner.destroy(entity);
        }
    }
}
