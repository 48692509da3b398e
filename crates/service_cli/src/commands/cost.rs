//! Cost command implementation
//!
//! Reports the cost of the optimal schedule without running it.

use revolve_core::{adjust, expense, numforw};
use serde::Serialize;
use tracing::info;

use super::Format;
use crate::Result;

/// Cost figures for one `(steps, checkpoints)` pair.
#[derive(Debug, Serialize, PartialEq)]
struct CostReport {
    steps: usize,
    checkpoints: usize,
    recommended_checkpoints: usize,
    forward_steps: usize,
    expense: f64,
}

impl CostReport {
    fn compute(steps: usize, checkpoints: Option<usize>) -> Result<Self> {
        let recommended = adjust(steps);
        let checkpoints = checkpoints.unwrap_or(recommended);
        Ok(Self {
            steps,
            checkpoints,
            recommended_checkpoints: recommended,
            forward_steps: numforw(steps, checkpoints)?,
            expense: expense(steps, checkpoints)?,
        })
    }
}

/// Run the cost command
pub fn run(steps: usize, checkpoints: Option<usize>, format: Format) -> Result<()> {
    let report = CostReport::compute(steps, checkpoints)?;
    info!(steps, checkpoints = report.checkpoints, "cost computed");

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Table => {
            println!("{:<26}{:>12}", "Timesteps", report.steps);
            println!("{:<26}{:>12}", "Checkpoints", report.checkpoints);
            println!("{:<26}{:>12}", "Recommended checkpoints", report.recommended_checkpoints);
            println!("{:<26}{:>12}", "Forward steps", report.forward_steps);
            println!("{:<26}{:>12.4}", "Forward steps per step", report.expense);
        }
    }
    Ok(())
}
