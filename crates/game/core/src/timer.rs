//! Deferred, cancelable callbacks keyed by entity and purpose.
//!
//! Scheduling a key that is already armed replaces the old deadline. Firing
//! removes the handle *before* the world dispatches it, so a callback may
//! re-arm its own key. Cancelling a timer that already fired is a no-op.
use std::collections::BTreeMap;

use crate::types::{EntityId, Millis};

/// What a timer does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TimerPurpose {
    /// Interaction hold countdown on the interacting character.
    Interaction,
    /// End of the reload animation on a weapon.
    ReloadFinish,
    /// Magazine refill, slightly before the animation ends.
    ReloadTransfer,
    /// Next shot of a held trigger.
    Refire,
    /// End of the equip animation on a weapon.
    EquipFinish,
    /// Removal of an entity from the world (corpse lifespan).
    Despawn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerKey {
    pub entity: EntityId,
    pub purpose: TimerPurpose,
}

impl TimerKey {
    pub const fn new(entity: EntityId, purpose: TimerPurpose) -> Self {
        Self { entity, purpose }
    }
}

#[derive(Clone, Copy, Debug)]
struct Scheduled {
    armed_at: Millis,
    due: Millis,
    seq: u64,
}

#[derive(Clone, Debug, Default)]
pub struct TimerQueue {
    handles: BTreeMap<TimerKey, Scheduled>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `key` to fire `delay` after `now`, replacing any earlier deadline.
    pub fn schedule(&mut self, key: TimerKey, now: Millis, delay: Millis) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.handles.insert(
            key,
            Scheduled {
                armed_at: now,
                due: now + delay,
                seq,
            },
        );
    }

    /// Returns false if nothing was armed under `key`.
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        self.handles.remove(&key).is_some()
    }

    /// Cancels every timer owned by `entity`, returning how many were armed.
    pub fn cancel_entity(&mut self, entity: EntityId) -> usize {
        let before = self.handles.len();
        self.handles.retain(|key, _| key.entity != entity);
        before - self.handles.len()
    }

    pub fn is_active(&self, key: TimerKey) -> bool {
        self.handles.contains_key(&key)
    }

    pub fn remaining(&self, key: TimerKey, now: Millis) -> Option<Millis> {
        self.handles.get(&key).map(|s| s.due.saturating_sub(now))
    }

    /// Full length the timer was armed with.
    pub fn duration(&self, key: TimerKey) -> Option<Millis> {
        self.handles.get(&key).map(|s| s.due.saturating_sub(s.armed_at))
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.handles.values().map(|s| s.due).min()
    }

    /// Removes and returns the earliest timer due at or before `now`.
    ///
    /// Ties fire in scheduling order.
    pub fn pop_due(&mut self, now: Millis) -> Option<(TimerKey, Millis)> {
        let (key, scheduled) = self
            .handles
            .iter()
            .filter(|(_, s)| s.due <= now)
            .min_by_key(|(_, s)| (s.due, s.seq))
            .map(|(key, s)| (*key, *s))?;
        self.handles.remove(&key);
        Some((key, scheduled.due))
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
