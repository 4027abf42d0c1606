use crate::error::Rejection;

/// How much of a requested addition made it into the inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddStatus {
    None,
    Some,
    All,
}

/// Outcome of an inventory addition.
///
/// Partial and failed additions carry the limit that stopped them so the player
/// can tell "inventory full" from "too heavy" from "stack full".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddResult {
    pub requested: u32,
    pub granted: u32,
    pub status: AddStatus,
    pub reason: Option<Rejection>,
}

impl AddResult {
    pub fn all(requested: u32) -> Self {
        Self {
            requested,
            granted: requested,
            status: AddStatus::All,
            reason: None,
        }
    }

    pub fn some(requested: u32, granted: u32, reason: Rejection) -> Self {
        Self {
            requested,
            granted,
            status: AddStatus::Some,
            reason: Some(reason),
        }
    }

    pub fn none(requested: u32, reason: Rejection) -> Self {
        Self {
            requested,
            granted: 0,
            status: AddStatus::None,
            reason: Some(reason),
        }
    }

    /// Nothing was asked for, so nothing was given.
    pub fn nothing() -> Self {
        Self {
            requested: 0,
            granted: 0,
            status: AddStatus::None,
            reason: None,
        }
    }

    /// Result reported for a call made on an observer replica.
    pub fn forwarded(requested: u32) -> Self {
        Self::none(requested, Rejection::Unauthorized)
    }

    pub fn is_complete(&self) -> bool {
        self.status == AddStatus::All
    }

    /// Re-expresses the result against a larger original request.
    pub(crate) fn truncated_to_request(self, requested: u32) -> Self {
        match self.status {
            AddStatus::None | AddStatus::Some => Self { requested, ..self },
            AddStatus::All => Self::some(requested, self.granted, Rejection::StackFull),
        }
    }

    /// Player-facing explanation, if anything was held back.
    pub fn message(&self) -> Option<String> {
        let reason = self.reason.filter(Rejection::is_player_facing)?;
        Some(match self.status {
            AddStatus::Some => format!("Couldn't add entire stack to inventory. {reason}"),
            AddStatus::None => format!("Couldn't add item to inventory. {reason}"),
            AddStatus::All => return None,
        })
    }
}
