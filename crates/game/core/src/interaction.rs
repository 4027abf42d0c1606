//! Focus / hold / commit protocol between a character and an interactable.
//!
//! [`Interactable`] lives on the target entity; [`InteractionSession`] lives on
//! the character doing the interacting. The world runs the probe and the hold
//! countdown; this module only decides what a probe result means.
use crate::error::{Rejection, TargetIssue};
use crate::types::{EntityId, Millis};

/// What committing an interaction does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InteractKind {
    /// Take the item stack lying on the ground.
    Pickup,
    /// Open the entity's inventory as a loot source.
    Loot,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interactable {
    pub kind: InteractKind,
    pub name: String,
    pub action: String,
    /// Hold time before commit; zero commits on press.
    pub interaction_time: Millis,
    pub interaction_distance: f32,
    pub allow_multiple: bool,
    active: bool,
    interactors: Vec<EntityId>,
}

impl Interactable {
    pub const DEFAULT_DISTANCE: f32 = 200.0;

    pub fn new(kind: InteractKind, name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            action: action.into(),
            interaction_time: Millis::ZERO,
            interaction_distance: Self::DEFAULT_DISTANCE,
            allow_multiple: true,
            active: true,
            interactors: Vec::new(),
        }
    }

    pub fn with_time(mut self, interaction_time: Millis) -> Self {
        self.interaction_time = interaction_time;
        self
    }

    pub fn with_distance(mut self, interaction_distance: f32) -> Self {
        self.interaction_distance = interaction_distance;
        self
    }

    /// Only one interactor at a time.
    pub fn exclusive(mut self) -> Self {
        self.allow_multiple = false;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_instant(&self) -> bool {
        self.interaction_time.is_zero()
    }

    pub fn interactors(&self) -> &[EntityId] {
        &self.interactors
    }

    pub fn can_interact(&self) -> bool {
        let occupied = !self.allow_multiple && !self.interactors.is_empty();
        self.active && !occupied
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Deactivates the target and returns everyone who was using it.
    ///
    /// The caller must end focus and interaction for each of them.
    pub fn deactivate(&mut self) -> Vec<EntityId> {
        self.active = false;
        std::mem::take(&mut self.interactors)
    }

    /// Registers `who` as interacting.
    pub fn begin_interact(&mut self, who: EntityId) -> Result<(), Rejection> {
        if self.interactors.contains(&who) {
            return Ok(());
        }
        if !self.can_interact() {
            return Err(Rejection::InvalidTarget(TargetIssue::Unavailable));
        }
        self.interactors.push(who);
        Ok(())
    }

    /// Returns false if `who` was not interacting.
    pub fn end_interact(&mut self, who: EntityId) -> bool {
        let before = self.interactors.len();
        self.interactors.retain(|i| *i != who);
        self.interactors.len() != before
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// What a probe result means for the current focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusChange {
    Unchanged,
    /// A new target came into range. The caller stops any interaction with
    /// `previous` first.
    Focused {
        previous: Option<EntityId>,
        target: EntityId,
    },
    /// The focused target went out of range or out of sight.
    Lost {
        previous: EntityId,
        /// The interact key was held, so the target's interaction ends too.
        was_interacting: bool,
    },
}

/// Probe result, already filtered down to active interactables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusCandidate {
    pub target: EntityId,
    pub distance: f32,
    pub reach: f32,
}

/// Per-character interaction state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionSession {
    focus: Option<EntityId>,
    interact_held: bool,
    last_check: Option<Millis>,
}

impl InteractionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> Option<EntityId> {
        self.focus
    }

    pub fn is_held(&self) -> bool {
        self.interact_held
    }

    pub fn last_check(&self) -> Option<Millis> {
        self.last_check
    }

    pub(crate) fn set_held(&mut self, held: bool) {
        self.interact_held = held;
    }

    /// Whether a focus probe is due, recording the check when it is.
    pub fn check_due(&mut self, now: Millis, frequency: Millis) -> bool {
        let due = self
            .last_check
            .is_none_or(|last| now.saturating_sub(last) >= frequency);
        if due {
            self.last_check = Some(now);
        }
        due
    }

    /// Applies a probe result.
    ///
    /// A different target within its own reach takes focus. The current target
    /// is kept while it stays in reach. Anything else (out of reach, nothing hit,
    /// something that is not interactable) drops the current focus.
    pub fn resolve(&mut self, candidate: Option<FocusCandidate>) -> FocusChange {
        match (candidate, self.focus) {
            (Some(hit), current) if Some(hit.target) != current && hit.distance <= hit.reach => {
                self.focus = Some(hit.target);
                FocusChange::Focused {
                    previous: current,
                    target: hit.target,
                }
            }
            (Some(hit), Some(current)) if hit.target == current && hit.distance <= hit.reach => {
                FocusChange::Unchanged
            }
            (_, Some(previous)) => self.lose_focus(previous),
            (_, None) => FocusChange::Unchanged,
        }
    }

    /// Drops the focus unconditionally.
    pub fn clear(&mut self) -> FocusChange {
        match self.focus {
            Some(previous) => self.lose_focus(previous),
            None => FocusChange::Unchanged,
        }
    }

    fn lose_focus(&mut self, previous: EntityId) -> FocusChange {
        let was_interacting = std::mem::replace(&mut self.interact_held, false);
        self.focus = None;
        FocusChange::Lost {
            previous,
            was_interacting,
        }
    }
}

/// Fraction of a timed interaction completed, for UI polling.
pub fn progress(remaining: Millis, total: Millis) -> f32 {
    if total.is_zero() {
        return 1.0;
    }
    1.0 - (remaining.0 as f32 / total.0 as f32).abs()
}
