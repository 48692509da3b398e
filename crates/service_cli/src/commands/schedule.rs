//! Schedule command implementation
//!
//! Prints every action of the optimal schedule.

use revolve_core::{Action, ScheduleSummary, Scheduler};
use serde::Serialize;
use tracing::info;

use super::Format;
use crate::Result;

#[derive(Serialize)]
struct ScheduleReport<'a> {
    checkpoints: usize,
    steps: usize,
    summary: ScheduleSummary,
    actions: &'a [Action],
}

/// Run the schedule command
pub fn run(checkpoints: usize, steps: usize, format: Format) -> Result<()> {
    info!(checkpoints, steps, "computing schedule");
    let actions = Scheduler::new(checkpoints, steps)?.schedule()?;
    let summary = ScheduleSummary::from_actions(&actions);
    println!("{}", render(checkpoints, steps, &actions, &summary, format)?);
    Ok(())
}

fn render(
    checkpoints: usize,
    steps: usize,
    actions: &[Action],
    summary: &ScheduleSummary,
    format: Format,
) -> Result<String> {
    match format {
        Format::Json => {
            let report = ScheduleReport {
                checkpoints,
                steps,
                summary: *summary,
                actions,
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        Format::Table => {
            let mut out = String::new();
            out.push_str(&format!("{:>6}  action\n", "#"));
            out.push_str(&format!("{}\n", "-".repeat(40)));
            for (i, action) in actions.iter().enumerate() {
                out.push_str(&format!("{:>6}  {}\n", i, action));
            }
            out.push_str(&format!("{}\n", "-".repeat(40)));
            out.push_str(&format!(
                "forward {} ({} recomputed), reverse {}, snapshots {}, restores {}, peak {}/{}",
                summary.forward_steps,
                summary.recomputed_steps,
                summary.reverse_steps,
                summary.snapshots,
                summary.restores,
                summary.peak_checkpoints,
                checkpoints
            ));
            Ok(out)
        }
    }
}
