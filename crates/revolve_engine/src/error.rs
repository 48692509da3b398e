//! Error types for the execution engine.

use std::path::PathBuf;

use revolve_core::{ActionKind, ScheduleError};
use thiserror::Error;

use crate::compression::CompressionError;
use crate::storage::StoreError;

/// Errors raised while building a revolver or loading its configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Fewer than one checkpoint requested.
    #[error("Invalid checkpoint count {0}: at least one checkpoint is required")]
    InvalidCheckpoints(usize),

    /// Compression parameters rejected.
    #[error("Invalid compression configuration: {0}")]
    Compression(#[from] CompressionError),

    /// Slot store cannot hold the requested checkpoints.
    #[error("Slot store holds {capacity} slots, {checkpoints} checkpoints requested")]
    StoreCapacity {
        /// Slots in the store
        capacity: usize,
        /// Checkpoints requested
        checkpoints: usize,
    },

    /// Malformed TOML.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration file unreadable.
    #[error("Failed to read configuration file {path:?}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Environment variable holds an unusable value.
    #[error("Invalid value '{value}' for environment variable {key}")]
    Env {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

/// Errors raised by [`Revolver`](crate::Revolver).
///
/// `E` is the error type of the caller's operators and checkpoint; it is
/// returned unchanged through [`RevolverError::Collaborator`]. Any error
/// leaves the revolver in a failed state.
#[derive(Debug, Error)]
pub enum RevolverError<E> {
    /// Construction failed.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// The scheduler rejected the next step.
    #[error("Schedule error during {action} at timestep {timestep}: {source}")]
    Schedule {
        /// Last action executed
        action: ActionKind,
        /// Forward position when the error occurred
        timestep: usize,
        /// Underlying error
        #[source]
        source: ScheduleError,
    },

    /// Compressing or decompressing a snapshot failed.
    #[error("Compression error during {action} at timestep {timestep}: {source}")]
    Compression {
        /// Action being executed
        action: ActionKind,
        /// Timestep of the snapshot
        timestep: usize,
        /// Underlying error
        #[source]
        source: CompressionError,
    },

    /// The slot store rejected a payload.
    #[error("Storage error during {action} at timestep {timestep}: {source}")]
    Storage {
        /// Action being executed
        action: ActionKind,
        /// Timestep of the snapshot
        timestep: usize,
        /// Underlying error
        #[source]
        source: StoreError,
    },

    /// Method called in the wrong phase.
    #[error("Out of sequence: expected {expected} phase, revolver is {found}")]
    Sequence {
        /// Phase the method requires
        expected: &'static str,
        /// Current phase
        found: &'static str,
    },

    /// Scheduled slot index not below the checkpoint budget.
    #[error("Checkpoint budget violated at timestep {timestep}: slot {slot} with capacity {capacity}")]
    BudgetViolation {
        /// Requested slot
        slot: usize,
        /// Checkpoints available
        capacity: usize,
        /// Timestep of the snapshot
        timestep: usize,
    },

    /// Restore scheduled from a slot holding a different timestep or nothing.
    #[error("Slot {slot} does not hold timestep {timestep}")]
    EmptySlot {
        /// Slot index
        slot: usize,
        /// Expected timestep
        timestep: usize,
    },

    /// Error returned by an operator or the checkpoint.
    #[error(transparent)]
    Collaborator(E),
}

impl<E> RevolverError<E> {
    /// Returns the collaborator error, if that is what this is.
    pub fn into_collaborator(self) -> Option<E> {
        match self {
            RevolverError::Collaborator(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for revolver operations.
pub type RevolverResult<T, E> = Result<T, RevolverError<E>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("operator blew up at {0}")]
    struct OpError(usize);

    #[test]
    fn test_collaborator_is_transparent() {
        let err: RevolverError<OpError> = RevolverError::Collaborator(OpError(3));
        assert_eq!(err.to_string(), "operator blew up at 3");
        assert_eq!(err.into_collaborator(), Some(OpError(3)));
    }

    #[test]
    fn test_sequence_display() {
        let err: RevolverError<OpError> = RevolverError::Sequence {
            expected: "reversible",
            found: "pending",
        };
        assert_eq!(
            err.to_string(),
            "Out of sequence: expected reversible phase, revolver is pending"
        );
        assert!(err.into_collaborator().is_none());
    }

    #[test]
    fn test_schedule_error_keeps_context() {
        let err: RevolverError<OpError> = RevolverError::Schedule {
            action: ActionKind::Terminate,
            timestep: 0,
            source: ScheduleError::Exhausted,
        };
        let message = err.to_string();
        assert!(message.contains("terminate"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_error_from_compression() {
        let err: ConfigError = CompressionError::MissingCustomCodec.into();
        assert!(matches!(err, ConfigError::Compression(_)));
    }
}
