//! Small service implementations for headless hosts and tests.
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;
use tracing::{debug, trace};

use super::{
    EffectSink, NotificationSink, ProbeHit, SpatialProbe, SpawnError, SpawnKind, SpawnService,
};
use crate::types::{EntityId, Transform};

/// Probe over an empty world.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProbe;

impl SpatialProbe for NoProbe {
    fn probe(&self, _: Vec3, _: Vec3, _: f32, _: Option<EntityId>) -> Option<ProbeHit> {
        None
    }
}

/// Probe that reports one configurable hit whenever it is within reach.
#[derive(Debug, Default)]
pub struct FixedProbe {
    hit: Mutex<Option<ProbeHit>>,
}

impl FixedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hitting(entity: EntityId, distance: f32) -> Self {
        let probe = Self::new();
        probe.set(entity, distance);
        probe
    }

    pub fn set(&self, entity: EntityId, distance: f32) {
        if let Ok(mut hit) = self.hit.lock() {
            *hit = Some(ProbeHit {
                entity,
                point: Vec3::X * distance,
                distance,
            });
        }
    }

    pub fn clear(&self) {
        if let Ok(mut hit) = self.hit.lock() {
            *hit = None;
        }
    }
}

impl SpatialProbe for FixedProbe {
    fn probe(
        &self,
        _origin: Vec3,
        _direction: Vec3,
        max_distance: f32,
        ignore: Option<EntityId>,
    ) -> Option<ProbeHit> {
        let hit = (*self.hit.lock().ok()?)?;
        (hit.distance <= max_distance && Some(hit.entity) != ignore).then_some(hit)
    }
}

/// Effect sink that only traces.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogEffects;

impl EffectSink for LogEffects {
    fn play(&self, target: EntityId, effect: &str) {
        trace!(target: "core::effects", %target, effect, "play");
    }
}

/// Effect sink that keeps everything it was asked to play.
#[derive(Debug, Default)]
pub struct RecordingEffects {
    played: Mutex<Vec<(EntityId, String)>>,
}

impl RecordingEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<(EntityId, String)> {
        self.played.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn count(&self, effect: &str) -> usize {
        self.played
            .lock()
            .map(|p| p.iter().filter(|(_, e)| e == effect).count())
            .unwrap_or_default()
    }
}

impl EffectSink for RecordingEffects {
    fn play(&self, target: EntityId, effect: &str) {
        if let Ok(mut played) = self.played.lock() {
            played.push((target, effect.to_owned()));
        }
    }
}

/// Notification sink that traces and keeps every message.
#[derive(Debug, Default)]
pub struct RecordingNotifications {
    messages: Mutex<Vec<(EntityId, String)>>,
}

impl RecordingNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(EntityId, String)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Messages for `recipient` containing `needle`.
    pub fn count_for(&self, recipient: EntityId, needle: &str) -> usize {
        self.messages
            .lock()
            .map(|m| {
                m.iter()
                    .filter(|(to, text)| *to == recipient && text.contains(needle))
                    .count()
            })
            .unwrap_or_default()
    }

    pub fn last_for(&self, recipient: EntityId) -> Option<String> {
        let messages = self.messages.lock().ok()?;
        messages
            .iter()
            .rev()
            .find(|(to, _)| *to == recipient)
            .map(|(_, text)| text.clone())
    }
}

impl NotificationSink for RecordingNotifications {
    fn notify(&self, recipient: EntityId, message: &str) {
        debug!(target: "core::notify", %recipient, message);
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((recipient, message.to_owned()));
        }
    }
}

/// Spawner that hands out increasing ids starting at `first`.
#[derive(Debug)]
pub struct SequentialSpawner {
    next: AtomicU32,
    destroyed: Mutex<Vec<EntityId>>,
}

impl SequentialSpawner {
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
            destroyed: Mutex::new(Vec::new()),
        }
    }

    pub fn destroyed(&self) -> Vec<EntityId> {
        self.destroyed.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl Default for SequentialSpawner {
    fn default() -> Self {
        Self::starting_at(1000)
    }
}

impl SpawnService for SequentialSpawner {
    fn spawn(&self, kind: SpawnKind, at: Transform) -> Result<EntityId, SpawnError> {
        let id = EntityId(self.next.fetch_add(1, Ordering::Relaxed));
        trace!(target: "core::spawn", %id, %kind, location = ?at.location, "spawned");
        Ok(id)
    }

    fn destroy(&self, entity: EntityId) {
        if let Ok(mut destroyed) = self.destroyed.lock() {
            destroyed.push(entity);
        }
    }
}
