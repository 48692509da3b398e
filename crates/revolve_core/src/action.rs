//! Actions emitted by the scheduler.
//!
//! A schedule is a sequence of [`Action`]s, produced one at a time by
//! [`Scheduler::next_action`](crate::Scheduler::next_action) and consumed by
//! an execution engine that owns the simulation state.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Half-open range of timesteps `[start, end)` handed to an operator.
///
/// # Examples
///
/// ```
/// use revolve_core::StepRange;
///
/// let range = StepRange::new(3, 7);
/// assert_eq!(range.len(), 4);
/// assert!(!range.is_empty());
/// assert_eq!(StepRange::single(5), StepRange::new(5, 6));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepRange {
    /// First timestep covered by the range
    pub start: usize,
    /// One past the last timestep covered by the range
    pub end: usize,
}

impl StepRange {
    /// Creates a range covering `[start, end)`.
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "StepRange start {} > end {}", start, end);
        Self { start, end }
    }

    /// Creates a range covering the single step `[step, step + 1)`.
    #[inline]
    pub fn single(step: usize) -> Self {
        Self::new(step, step + 1)
    }

    /// Number of timesteps in the range.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the range covers no timesteps.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for StepRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// One step of a checkpointing schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Action {
    /// Run the forward operator over `[start, end)`.
    AdvanceForward {
        /// Timestep the forward state currently sits at
        start: usize,
        /// Timestep the forward state must reach
        end: usize,
    },

    /// Store the current forward state (at `timestep`) in `slot`.
    TakeSnapshot {
        /// Slot index in `0..checkpoints`
        slot: usize,
        /// Timestep of the stored state
        timestep: usize,
    },

    /// Replace the current forward state by the one stored in `slot`.
    Restore {
        /// Slot index in `0..checkpoints`
        slot: usize,
        /// Timestep of the restored state
        timestep: usize,
    },

    /// Reverse the step `[timestep, timestep + 1)`.
    ///
    /// The forward state at `timestep` is available. When `first` is set the
    /// forward step `timestep -> timestep + 1` has not been executed yet; it is
    /// the last step of the forward sweep.
    AdvanceReverse {
        /// Start of the reversed step
        timestep: usize,
        /// Whether this is the first reverse step of the schedule
        first: bool,
    },

    /// The schedule is complete.
    Terminate,
}

/// Fieldless discriminant of an [`Action`], used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ActionKind {
    /// See [`Action::AdvanceForward`]
    AdvanceForward,
    /// See [`Action::TakeSnapshot`]
    TakeSnapshot,
    /// See [`Action::Restore`]
    Restore,
    /// See [`Action::AdvanceReverse`]
    AdvanceReverse,
    /// See [`Action::Terminate`]
    Terminate,
}

impl Action {
    /// Returns the discriminant of this action.
    #[inline]
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::AdvanceForward { .. } => ActionKind::AdvanceForward,
            Action::TakeSnapshot { .. } => ActionKind::TakeSnapshot,
            Action::Restore { .. } => ActionKind::Restore,
            Action::AdvanceReverse { .. } => ActionKind::AdvanceReverse,
            Action::Terminate => ActionKind::Terminate,
        }
    }

    /// Timestep the action refers to.
    ///
    /// For `AdvanceForward` this is the start of the range, for `Terminate`
    /// it is `None`.
    pub fn timestep(&self) -> Option<usize> {
        match *self {
            Action::AdvanceForward { start, .. } => Some(start),
            Action::TakeSnapshot { timestep, .. }
            | Action::Restore { timestep, .. }
            | Action::AdvanceReverse { timestep, .. } => Some(timestep),
            Action::Terminate => None,
        }
    }

    /// Step range covered by the action, if it runs an operator.
    pub fn range(&self) -> Option<StepRange> {
        match *self {
            Action::AdvanceForward { start, end } => Some(StepRange::new(start, end)),
            Action::AdvanceReverse { timestep, .. } => Some(StepRange::single(timestep)),
            _ => None,
        }
    }

    /// Returns true for [`Action::Terminate`].
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::Terminate)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::AdvanceForward => "advance_forward",
            ActionKind::TakeSnapshot => "take_snapshot",
            ActionKind::Restore => "restore",
            ActionKind::AdvanceReverse => "advance_reverse",
            ActionKind::Terminate => "terminate",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Action::AdvanceForward { start, end } => {
                write!(f, "advance   {:>6} -> {}", start, end)
            }
            Action::TakeSnapshot { slot, timestep } => {
                write!(f, "snapshot  {:>6} -> slot {}", timestep, slot)
            }
            Action::Restore { slot, timestep } => {
                write!(f, "restore   {:>6} <- slot {}", timestep, slot)
            }
            Action::AdvanceReverse { timestep, first } => {
                let label = if first { "first turn" } else { "turn" };
                write!(f, "reverse   {:>6} ({})", timestep, label)
            }
            Action::Terminate => f.write_str("terminate"),
        }
    }
}
