//! CLI error types.

use std::convert::Infallible;

use revolve_core::ScheduleError;
use revolve_engine::{ConfigError, RevolverError};
use thiserror::Error;

/// Errors surfaced to the command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument value not usable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Scheduling failed.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Revolver run failed.
    #[error(transparent)]
    Run(#[from] RevolverError<Infallible>),

    /// JSON output failed.
    #[error("JSON serialisation failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The simulation did not return to its origin.
    #[error("Verification failed after {sweep} sweep: expected {expected}, found {found}")]
    Verification {
        /// Sweep just completed
        sweep: &'static str,
        /// Expected element value
        expected: f64,
        /// Element value furthest from the expectation
        found: f64,
    },
}

/// Result type for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;
