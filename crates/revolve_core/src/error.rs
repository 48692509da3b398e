//! Error types for checkpoint scheduling.

use thiserror::Error;

/// Errors raised by the scheduler and the binomial cost functions.
///
/// # Examples
/// ```
/// use revolve_core::ScheduleError;
///
/// let err = ScheduleError::InvalidCheckpoints(0);
/// assert_eq!(
///     err.to_string(),
///     "Invalid checkpoint count 0: at least one checkpoint is required"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Fewer than one checkpoint was requested.
    #[error("Invalid checkpoint count {0}: at least one checkpoint is required")]
    InvalidCheckpoints(usize),

    /// `next_action` was called after the schedule returned `Terminate`.
    #[error("Schedule exhausted: no action follows Terminate")]
    Exhausted,

    /// A snapshot would occupy more slots than are available.
    ///
    /// Indicates a defect in the schedule, never a user error.
    #[error("Checkpoint budget exceeded: slot {slot} requested with {available} available")]
    BudgetExceeded {
        /// Slot index that was requested
        slot: usize,
        /// Number of slots available
        available: usize,
    },

    /// Binomial arithmetic overflowed for the requested problem size.
    #[error("Binomial range overflow for {steps} steps with {checkpoints} checkpoints")]
    RangeOverflow {
        /// Number of steps in the window
        steps: usize,
        /// Number of free checkpoints
        checkpoints: usize,
    },
}

/// Result type for scheduling operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_exceeded_display() {
        let err = ScheduleError::BudgetExceeded {
            slot: 4,
            available: 4,
        };
        assert!(err.to_string().contains("slot 4"));
        assert!(err.to_string().contains("4 available"));
    }

    #[test]
    fn test_exhausted_display() {
        assert!(ScheduleError::Exhausted.to_string().contains("exhausted"));
    }
}
