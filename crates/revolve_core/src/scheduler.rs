//! Incremental revolve scheduler.
//!
//! The [`Scheduler`] produces the optimal binomial checkpointing schedule one
//! [`Action`] at a time. It keeps the forward position (`capo`), the end of
//! the window that still has to be reversed (`fine`) and a stack with the
//! timestep held by every occupied checkpoint slot.

use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::binomial::{adjust, snapshot_offset};
use crate::error::{ScheduleError, ScheduleResult};

/// Optimal checkpoint scheduler for a fixed number of timesteps.
///
/// # Invariants
///
/// - The number of occupied slots never exceeds `checkpoints_available`.
/// - The forward position only decreases on [`Action::Restore`].
/// - Slot `i` always holds an earlier timestep than slot `i + 1`.
///
/// # Examples
///
/// ```
/// use revolve_core::{Action, Scheduler};
///
/// let mut scheduler = Scheduler::new(1, 3).unwrap();
/// assert_eq!(
///     scheduler.next_action().unwrap(),
///     Action::TakeSnapshot { slot: 0, timestep: 0 }
/// );
/// assert_eq!(
///     scheduler.next_action().unwrap(),
///     Action::AdvanceForward { start: 0, end: 2 }
/// );
/// assert_eq!(
///     scheduler.next_action().unwrap(),
///     Action::AdvanceReverse { timestep: 2, first: true }
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Scheduler {
    /// Maximum number of checkpoints held simultaneously
    checkpoints: usize,

    /// Number of timesteps of the forward computation
    total_steps: usize,

    /// Current forward position
    capo: usize,

    /// End of the window that still has to be reversed
    fine: usize,

    /// Timestep held by each occupied slot; the last entry is the newest
    slots: Vec<usize>,

    /// Whether the first reverse step has been emitted
    turned: bool,

    /// Whether `Terminate` has been emitted
    exhausted: bool,

    /// Largest number of slots occupied at once
    peak: usize,
}

impl Scheduler {
    /// Creates a scheduler for `total_steps` timesteps with at most
    /// `checkpoints` snapshots held simultaneously.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidCheckpoints`] if `checkpoints == 0`.
    pub fn new(checkpoints: usize, total_steps: usize) -> ScheduleResult<Self> {
        if checkpoints < 1 {
            return Err(ScheduleError::InvalidCheckpoints(checkpoints));
        }
        Ok(Self::start(checkpoints, total_steps))
    }

    /// Creates a scheduler using the recommended checkpoint count
    /// [`adjust(total_steps)`](crate::adjust).
    pub fn with_optimal_checkpoints(total_steps: usize) -> Self {
        // adjust never returns 0.
        Self::start(adjust(total_steps), total_steps)
    }

    fn start(checkpoints: usize, total_steps: usize) -> Self {
        Self {
            checkpoints,
            total_steps,
            capo: 0,
            fine: total_steps,
            slots: Vec::with_capacity(checkpoints.min(total_steps.max(1))),
            turned: false,
            exhausted: false,
            peak: 0,
        }
    }

    /// Maximum number of checkpoints held simultaneously.
    #[inline]
    pub fn checkpoints_available(&self) -> usize {
        self.checkpoints
    }

    /// Number of timesteps of the forward computation.
    #[inline]
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Current forward position.
    #[inline]
    pub fn position(&self) -> usize {
        self.capo
    }

    /// End of the window that still has to be reversed.
    #[inline]
    pub fn window_end(&self) -> usize {
        self.fine
    }

    /// Number of currently occupied checkpoint slots.
    #[inline]
    pub fn checkpoints_used(&self) -> usize {
        self.slots.len()
    }

    /// Largest number of slots occupied at once so far.
    #[inline]
    pub fn peak_checkpoints_used(&self) -> usize {
        self.peak
    }

    /// Returns true once `Terminate` has been emitted.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Restarts the schedule from timestep 0 with the same configuration.
    pub fn reset(&mut self) {
        self.capo = 0;
        self.fine = self.total_steps;
        self.slots.clear();
        self.turned = false;
        self.exhausted = false;
        self.peak = 0;
    }

    /// Returns the next action of the schedule.
    ///
    /// # Errors
    ///
    /// - [`ScheduleError::Exhausted`] if `Terminate` was already returned.
    /// - [`ScheduleError::BudgetExceeded`] if a snapshot would need more slots
    ///   than available (cannot happen for a well-formed schedule).
    pub fn next_action(&mut self) -> ScheduleResult<Action> {
        if self.exhausted {
            return Err(ScheduleError::Exhausted);
        }
        if self.slots.is_empty() && self.capo < self.fine {
            self.turned = false;
        }

        let action = match self.fine - self.capo {
            0 => self.restore_or_terminate(),
            1 => self.turn(),
            _ => self.snapshot_or_advance()?,
        };

        trace!(
            action = %action.kind(),
            capo = self.capo,
            fine = self.fine,
            used = self.slots.len(),
            "scheduled"
        );
        if action.is_terminal() {
            self.exhausted = true;
        }
        Ok(action)
    }

    /// Drains the remaining actions, including the final `Terminate`.
    pub fn schedule(&mut self) -> ScheduleResult<Vec<Action>> {
        self.by_ref().collect()
    }

    /// Window fully reversed: go back to the newest checkpoint, or finish.
    fn restore_or_terminate(&mut self) -> Action {
        match self.slots.last() {
            Some(&timestep) if self.slots[0] != self.capo => {
                self.capo = timestep;
                Action::Restore {
                    slot: self.slots.len() - 1,
                    timestep,
                }
            }
            _ => Action::Terminate,
        }
    }

    /// One step left in the window: reverse it.
    fn turn(&mut self) -> Action {
        self.fine -= 1;
        if self.slots.last() == Some(&self.capo) {
            // The slot is not needed once its own step is reversed.
            self.slots.pop();
        }
        let first = !self.turned;
        self.turned = true;
        Action::AdvanceReverse {
            timestep: self.capo,
            first,
        }
    }

    /// Several steps left: store the current position unless already stored,
    /// otherwise advance to the next snapshot position.
    fn snapshot_or_advance(&mut self) -> ScheduleResult<Action> {
        if self.slots.last() != Some(&self.capo) {
            let slot = self.slots.len();
            if slot >= self.checkpoints {
                return Err(ScheduleError::BudgetExceeded {
                    slot,
                    available: self.checkpoints,
                });
            }
            self.slots.push(self.capo);
            self.peak = self.peak.max(self.slots.len());
            return Ok(Action::TakeSnapshot {
                slot,
                timestep: self.capo,
            });
        }

        let free = self.checkpoints + 1 - self.slots.len();
        let start = self.capo;
        self.capo += snapshot_offset(free, self.fine - self.capo);
        Ok(Action::AdvanceForward {
            start,
            end: self.capo,
        })
    }
}

impl Iterator for Scheduler {
    type Item = ScheduleResult<Action>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            None
        } else {
            Some(self.next_action())
        }
    }
}

/// Aggregate counts of a complete schedule.
///
/// # Examples
///
/// ```
/// use revolve_core::ScheduleSummary;
///
/// let summary = ScheduleSummary::compute(10, 100).unwrap();
/// assert_eq!(summary.forward_steps, 222);
/// assert_eq!(summary.reverse_steps, 100);
/// assert!(summary.peak_checkpoints <= 10);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduleSummary {
    /// Forward steps executed by `AdvanceForward` actions
    pub forward_steps: usize,

    /// Forward steps executed after the first reverse step
    pub recomputed_steps: usize,

    /// Number of `TakeSnapshot` actions
    pub snapshots: usize,

    /// Number of `Restore` actions
    pub restores: usize,

    /// Number of `AdvanceReverse` actions
    pub reverse_steps: usize,

    /// Largest number of checkpoints held at once
    pub peak_checkpoints: usize,

    /// Total number of actions including `Terminate`
    pub actions: usize,
}

impl ScheduleSummary {
    /// Runs a full schedule for `(checkpoints, steps)` and summarises it.
    pub fn compute(checkpoints: usize, steps: usize) -> ScheduleResult<Self> {
        let mut scheduler = Scheduler::new(checkpoints, steps)?;
        let actions = scheduler.schedule()?;
        Ok(Self::from_actions(&actions))
    }

    /// Summarises an already materialised schedule.
    pub fn from_actions(actions: &[Action]) -> Self {
        let mut summary = Self::default();
        let mut turned = false;
        for action in actions {
            summary.actions += 1;
            match *action {
                Action::AdvanceForward { start, end } => {
                    summary.forward_steps += end - start;
                    if turned {
                        summary.recomputed_steps += end - start;
                    }
                }
                Action::TakeSnapshot { slot, .. } => {
                    summary.snapshots += 1;
                    summary.peak_checkpoints = summary.peak_checkpoints.max(slot + 1);
                }
                Action::Restore { .. } => summary.restores += 1,
                Action::AdvanceReverse { .. } => {
                    summary.reverse_steps += 1;
                    turned = true;
                }
                Action::Terminate => {}
            }
        }
        summary
    }
}
