//! Run command implementation
//!
//! Drives an increment/decrement simulation through the revolver and checks
//! that the forward sweep reaches `steps` and the reverse sweep returns to
//! the origin.

use std::convert::Infallible;

use revolve_core::StepRange;
use revolve_engine::{Field, FieldCheckpoint, Revolver, RevolverConfig, RevolverStats};
use tracing::info;

use crate::{CliError, Result};

fn increment(state: &mut Field, range: StepRange) -> std::result::Result<(), Infallible> {
    state.add_scalar(range.len() as f64);
    Ok(())
}

fn decrement(state: &mut Field, range: StepRange) -> std::result::Result<(), Infallible> {
    state.add_scalar(-(range.len() as f64));
    Ok(())
}

/// Parses a shape such as `10x10` or `64`.
pub fn parse_shape(s: &str) -> Result<Vec<usize>> {
    let shape = s
        .split(['x', 'X', ','])
        .map(|dim| {
            dim.trim().parse::<usize>().map_err(|_| {
                CliError::InvalidArgument(format!("invalid dimension '{}' in shape '{}'", dim, s))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    if shape.contains(&0) {
        return Err(CliError::InvalidArgument(format!(
            "shape '{}' has an empty dimension",
            s
        )));
    }
    Ok(shape)
}

/// Largest element-wise distance from `expected`.
fn deviation(field: &Field, expected: f64) -> f64 {
    field
        .values()
        .iter()
        .map(|v| (v - expected).abs())
        .fold(0.0, f64::max)
}

/// Run the simulation and return its statistics.
pub fn simulate(config: &RevolverConfig, shape: Vec<usize>) -> Result<RevolverStats> {
    let mut revolver = Revolver::builder(
        FieldCheckpoint::new(),
        increment,
        decrement,
        Field::zeros(shape),
    )
    .config(config)?
    .build()?;

    info!(
        checkpoints = revolver.checkpoints_available(),
        steps = revolver.total_steps(),
        scheme = %revolver.compression().scheme,
        "running increment simulation"
    );

    let steps = revolver.total_steps() as f64;
    revolver.apply_forward()?;
    let found = deviation(revolver.state(), steps);
    if found > 0.0 {
        return Err(CliError::Verification {
            sweep: "forward",
            expected: steps,
            found: steps + found,
        });
    }

    revolver.apply_reverse()?;
    // Each lossy restore may shift the state by the tolerance, and snapshots
    // taken from restored states can stack one error per checkpoint level.
    let bound = if config.compression.scheme.is_lossless() {
        0.0
    } else {
        config.compression.tolerance * (revolver.checkpoints_available() + 1) as f64
    };
    let found = deviation(revolver.state(), 0.0);
    if found > bound {
        return Err(CliError::Verification {
            sweep: "reverse",
            expected: 0.0,
            found,
        });
    }

    Ok(revolver.stats().clone())
}

/// Run the run command
pub fn run(config: &RevolverConfig, shape: &str) -> Result<()> {
    let stats = simulate(config, parse_shape(shape)?)?;
    println!("{}", stats);
    info!("simulation verified");
    Ok(())
}
