//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod cost;
pub mod run;
pub mod schedule;

/// Output format shared by the reporting commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Human-readable table
    #[default]
    Table,
    /// JSON document on stdout
    Json,
}
