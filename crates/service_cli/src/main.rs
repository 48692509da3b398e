//! Revolve CLI - Command Line Operations for Checkpoint Scheduling
//!
//! # Commands
//!
//! - `revolve schedule --checkpoints N --steps M` - Print the optimal schedule
//! - `revolve cost --steps M [--checkpoints N]` - Report schedule cost
//! - `revolve run --steps M [--scheme S]` - Run and verify an increment simulation
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate drives `revolve_core` and
//! `revolve_engine` from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use revolve_engine::compression::Scheme;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use commands::Format;
use config::RunArgs;

/// Revolve checkpoint scheduling CLI
#[derive(Parser)]
#[command(name = "revolve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every action of the optimal schedule
    Schedule {
        /// Checkpoints held simultaneously
        #[arg(short, long)]
        checkpoints: usize,

        /// Number of timesteps
        #[arg(short, long)]
        steps: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },

    /// Report forward-step cost and the recommended checkpoint count
    Cost {
        /// Number of timesteps
        #[arg(short, long)]
        steps: usize,

        /// Checkpoints held simultaneously (recommended count if omitted)
        #[arg(short, long)]
        checkpoints: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },

    /// Run an increment simulation through the revolver and verify it
    Run {
        /// Configuration file path (TOML format)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Number of timesteps
        #[arg(short, long)]
        steps: Option<usize>,

        /// Checkpoints held simultaneously
        #[arg(short, long)]
        checkpoints: Option<usize>,

        /// Compression scheme (none, zstd, quantize)
        #[arg(long)]
        scheme: Option<Scheme>,

        /// Absolute error bound of the lossy scheme
        #[arg(long)]
        tolerance: Option<f64>,

        /// zstd compression level
        #[arg(long)]
        level: Option<i32>,

        /// Field shape, e.g. 10x10
        #[arg(long, default_value = "10x10")]
        shape: String,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Schedule {
            checkpoints,
            steps,
            format,
        } => commands::schedule::run(checkpoints, steps, format),
        Commands::Cost {
            steps,
            checkpoints,
            format,
        } => commands::cost::run(steps, checkpoints, format),
        Commands::Run {
            config,
            steps,
            checkpoints,
            scheme,
            tolerance,
            level,
            shape,
        } => {
            let args = RunArgs {
                config_file: config,
                steps,
                checkpoints,
                scheme,
                tolerance,
                level,
            };
            let config = config::build_config(&args)?;
            debug!(?config, "configuration loaded");
            commands::run::run(&config, &shape)
        }
    }
}

/// Logs a failed command once and maps it to the process exit status.
fn exit_status(result: Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            error!("{}", err);
            1
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    ExitCode::from(exit_status(dispatch(cli.command)))
}
