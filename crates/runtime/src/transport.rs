//! Wire frames exchanged between replicas.
//!
//! The session channels carry opaque bytes; these frames are what the bytes
//! decode to. Intents travel observer to authority, state syncs and
//! notifications travel back.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use survival_core::{IntentEnvelope, StateSync};

use crate::api::{Result, RuntimeError};

/// Intents one observer queued since its last flush, in issue order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uplink {
    pub intents: Vec<IntentEnvelope>,
}

/// Everything the authority has for one observer since the last push.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Downlink {
    pub syncs: Vec<StateSync>,
    pub notices: Vec<String>,
}

impl Downlink {
    pub fn is_empty(&self) -> bool {
        self.syncs.is_empty() && self.notices.is_empty()
    }
}

pub fn encode<T: Serialize>(frame: &T) -> Result<Vec<u8>> {
    bincode::serialize(frame).map_err(RuntimeError::Encode)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(RuntimeError::Decode)
}
