//! Event types for different topics.

use serde::{Deserialize, Serialize};
use survival_core::{EntityId, Millis, Rejection};

/// Outcome of an intent the authority received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IntentEvent {
    Accepted {
        sender: EntityId,
        intent: String,
        at: Millis,
    },
    Rejected {
        sender: EntityId,
        intent: String,
        reason: Rejection,
        at: Millis,
    },
}

/// State-sync traffic pushed to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncEvent {
    Pushed {
        player: EntityId,
        messages: usize,
        notices: usize,
        bytes: usize,
    },
}

/// Entities and players coming and going.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    Spawned { entity: EntityId, kind: String },
    Destroyed { entity: EntityId },
    PlayerConnected { player: EntityId, at: Millis },
    PlayerDisconnected { player: EntityId },
}
