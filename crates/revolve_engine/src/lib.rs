//! # Revolve Engine (Layer 2: Execution)
//!
//! ## Layer 2 Role
//!
//! revolve_engine executes a checkpointed adjoint computation:
//! - [`Revolver`]: drives forward/reverse [`Operator`]s and a [`Checkpoint`]
//!   through the schedule computed by `revolve_core`
//! - [`compression`]: uniform codec interface (none, zstd, error-bounded
//!   quantisation, custom) applied to every snapshot
//! - [`storage`]: indexed slot store with an optional byte budget
//! - [`config`]: TOML and environment configuration
//!
//! ## Usage Example
//!
//! ```rust
//! use std::convert::Infallible;
//!
//! use revolve_core::StepRange;
//! use revolve_engine::compression::{CompressionParams, Scheme};
//! use revolve_engine::{Field, FieldCheckpoint, Revolver};
//!
//! fn step(delta: f64) -> impl FnMut(&mut Field, StepRange) -> Result<(), Infallible> {
//!     move |state, range| {
//!         state.add_scalar(delta * range.len() as f64);
//!         Ok(())
//!     }
//! }
//!
//! let mut revolver = Revolver::new(
//!     FieldCheckpoint::new(),
//!     step(1.0),
//!     step(-1.0),
//!     Field::zeros(vec![10, 10]),
//!     10,
//!     100,
//!     CompressionParams::new(Scheme::Zstd),
//! )
//! .unwrap();
//!
//! revolver.apply_forward().unwrap();
//! assert!(revolver.state().values().iter().all(|&v| v == 100.0));
//! revolver.apply_reverse().unwrap();
//! assert!(revolver.state().values().iter().all(|&v| v == 0.0));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
// Allow unknown lints for clippy compatibility across versions
#![allow(unknown_lints)]

pub mod compression;
pub mod config;
pub mod error;
pub mod field;
pub mod operator;
pub mod revolver;
pub mod stats;
pub mod storage;

pub use config::{CompressionConfig, RevolverConfig};
pub use error::{ConfigError, RevolverError, RevolverResult};
pub use field::Field;
pub use operator::{Checkpoint, FieldCheckpoint, Operator};
pub use revolver::{Phase, Revolver, RevolverBuilder};
pub use stats::RevolverStats;
pub use storage::{MemoryBudget, MemoryStore, SlotStore, StoreError, StoredSlot};
