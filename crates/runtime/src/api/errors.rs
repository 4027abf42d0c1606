//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, the wire codec, and gameplay
//! rejections so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use survival_core::{EntityId, ErrorSeverity, GameError, Rejection, SpawnError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("authority worker command channel closed")]
    CommandChannelClosed,

    #[error("authority worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("authority worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("session requires an item catalog before building")]
    MissingCatalog,

    #[error("failed to encode frame")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode frame")]
    Decode(#[source] bincode::Error),

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error("no character {player} to connect")]
    UnknownPlayer { player: EntityId },

    #[error("player {player} is already connected")]
    AlreadyConnected { player: EntityId },
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Rejected(rejection) => rejection.severity(),
            Self::UnknownPlayer { .. } | Self::AlreadyConnected { .. } | Self::Spawn(_) => {
                ErrorSeverity::Validation
            }
            Self::MissingCatalog | Self::Encode(_) | Self::Decode(_) => ErrorSeverity::Internal,
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => {
                ErrorSeverity::Fatal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            Self::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            Self::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            Self::MissingCatalog => "RUNTIME_MISSING_CATALOG",
            Self::Encode(_) => "RUNTIME_ENCODE",
            Self::Decode(_) => "RUNTIME_DECODE",
            Self::Rejected(rejection) => rejection.error_code(),
            Self::Spawn(_) => "RUNTIME_SPAWN",
            Self::UnknownPlayer { .. } => "RUNTIME_UNKNOWN_PLAYER",
            Self::AlreadyConnected { .. } => "RUNTIME_ALREADY_CONNECTED",
        }
    }
}
