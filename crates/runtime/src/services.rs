//! Host services a replica hands to its world on every call.
use std::sync::{Arc, Mutex};

use survival_core::env::LogEffects;
use survival_core::{
    EffectSink, EntityId, Env, NotificationSink, SpatialProbe, SpawnService,
};
use tracing::debug;

use crate::arena::Arena;

/// Notification sink that holds messages until the host routes them.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    pending: Mutex<Vec<(EntityId, String)>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, recipient: EntityId, message: impl Into<String>) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push((recipient, message.into()));
        }
    }

    /// Removes and returns everything posted so far, oldest first.
    pub fn drain(&self) -> Vec<(EntityId, String)> {
        self.pending
            .lock()
            .map(|mut pending| std::mem::take(&mut *pending))
            .unwrap_or_default()
    }
}

impl NotificationSink for NoticeBoard {
    fn notify(&self, recipient: EntityId, message: &str) {
        debug!(target: "runtime::notice", %recipient, message);
        self.post(recipient, message);
    }
}

pub(crate) struct Services {
    pub(crate) arena: Arc<Arena>,
    pub(crate) effects: LogEffects,
    pub(crate) notices: NoticeBoard,
    /// Only the authority may create or remove entities.
    spawns: bool,
}

impl Services {
    pub(crate) fn authority(arena: Arc<Arena>) -> Self {
        Self {
            arena,
            effects: LogEffects,
            notices: NoticeBoard::new(),
            spawns: true,
        }
    }

    pub(crate) fn observer(arena: Arc<Arena>) -> Self {
        Self {
            spawns: false,
            ..Self::authority(arena)
        }
    }

    pub(crate) fn env(&self) -> Env<'_> {
        let arena = &*self.arena;
        Env::new(
            Some(arena as &dyn SpatialProbe),
            Some(&self.effects as &dyn EffectSink),
            Some(&self.notices as &dyn NotificationSink),
            self.spawns.then_some(arena as &dyn SpawnService),
        )
    }
}
