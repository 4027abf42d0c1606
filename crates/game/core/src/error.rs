//! Common error infrastructure for survival-core.
//!
//! Every gameplay failure is a *logical rejection*: the operation leaves state
//! untouched and returns a typed reason that the caller (usually the UI layer)
//! can turn into a player-facing message. [`Rejection`] is that taxonomy, and
//! [`GameError`] classifies it for logging and recovery.
//!
//! # Design Principles
//!
//! - **Typed results**: rejections are returned, never panicked
//! - **Distinct reasons**: "inventory full", "too heavy" and "stack full" render
//!   differently so players know how to resolve them
//! - **Severity Classification**: errors are categorized for recovery strategies

use crate::weapon::WeaponState;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the player can resolve it (drop items, find ammo, wait)
/// - **Validation**: the request itself was wrong or aimed at the wrong replica
/// - **Internal**: unexpected state inconsistency that requires investigation
/// - **Fatal**: unrecoverable, the world state can no longer be trusted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - can retry once the player changes something.
    ///
    /// Examples: inventory full, magazine empty
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: target out of range, intent sent for someone else's character
    Validation,

    /// Internal error - unexpected state inconsistency.
    Internal,

    /// Fatal error - game state corrupted, cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all survival-core errors.
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Which inventory limit stopped an addition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CapacityLimit {
    Slots,
    Weight,
}

impl CapacityLimit {
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Slots => "Inventory is full.",
            Self::Weight => "Carrying too much weight.",
        }
    }
}

/// Why an interaction, loot, or use request had nothing valid to act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetIssue {
    #[error("no such entity")]
    Missing,
    #[error("target is out of range")]
    OutOfRange,
    #[error("target is not interactable right now")]
    Unavailable,
    #[error("item is not in the inventory")]
    ItemMissing,
    #[error("not looting anything")]
    NoLootSession,
    #[error("actor is dead")]
    Dead,
    #[error("actor belongs to another player")]
    NotOwned,
}

/// Why a weapon refused a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NotReadyReason {
    #[error("Clip full. No need to reload.")]
    MagazineFull,
    #[error("Not enough ammo to reload.")]
    NoReserveAmmo,
    #[error("Out of ammo.")]
    OutOfAmmo,
    #[error("Weapon is busy ({0}).")]
    Busy(WeaponState),
    #[error("No weapon equipped.")]
    NoWeapon,
    #[error("No throwable items in inventory.")]
    NoThrowable,
    #[error("Firing faster than the weapon allows.")]
    FireRate,
}

/// Logical rejection of a gameplay request.
///
/// None of these are faults: state is left unchanged and the caller decides
/// whether and how to inform the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rejection {
    #[error("{}", .0.message())]
    CapacityExceeded(CapacityLimit),

    #[error("Stack is already full.")]
    StackFull,

    /// The call was made on an observer and has been forwarded to the authority.
    #[error("request forwarded to the authority")]
    Unauthorized,

    #[error("invalid target: {0}")]
    InvalidTarget(TargetIssue),

    #[error("{0}")]
    NotReady(NotReadyReason),
}

impl Rejection {
    pub const fn full() -> Self {
        Self::CapacityExceeded(CapacityLimit::Slots)
    }

    pub const fn too_heavy() -> Self {
        Self::CapacityExceeded(CapacityLimit::Weight)
    }

    /// Whether this rejection should be shown to the acting player.
    ///
    /// Forwarded requests and stale targets are silent.
    pub const fn is_player_facing(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded(_) | Self::StackFull | Self::NotReady(_)
        )
    }
}

impl GameError for Rejection {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CapacityExceeded(_) | Self::StackFull | Self::NotReady(_) => {
                ErrorSeverity::Recoverable
            }
            Self::Unauthorized | Self::InvalidTarget(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::CapacityExceeded(CapacityLimit::Slots) => "INVENTORY_FULL",
            Self::CapacityExceeded(CapacityLimit::Weight) => "INVENTORY_TOO_HEAVY",
            Self::StackFull => "INVENTORY_STACK_FULL",
            Self::Unauthorized => "NOT_AUTHORITY",
            Self::InvalidTarget(_) => "INVALID_TARGET",
            Self::NotReady(_) => "WEAPON_NOT_READY",
        }
    }
}
