//! # Revolve Core (Layer 1: Scheduling Kernel)
//!
//! ## Layer 1 Role
//!
//! revolve_core computes optimal checkpointing schedules for adjoint
//! (forward-then-reverse) computations:
//! - Binomial cost functions (`maxrange`, `numforw`, `expense`, `adjust`)
//! - The incremental [`Scheduler`] emitting one [`Action`] at a time
//! - Schedule accounting via [`ScheduleSummary`]
//!
//! The crate is pure computation. It never touches simulation state; the
//! execution engine in `revolve_engine` drives operators and storage from
//! the actions produced here.
//!
//! ## Usage Example
//!
//! ```rust
//! use revolve_core::{Action, Scheduler};
//!
//! let mut scheduler = Scheduler::new(2, 4).unwrap();
//! let mut reverse_steps = 0;
//! loop {
//!     match scheduler.next_action().unwrap() {
//!         Action::AdvanceReverse { .. } => reverse_steps += 1,
//!         Action::Terminate => break,
//!         _ => {}
//!     }
//! }
//! assert_eq!(reverse_steps, 4);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for [`Action`], [`StepRange`] and
//!   [`ScheduleSummary`]

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
// Allow unknown lints for clippy compatibility across versions
#![allow(unknown_lints)]

pub mod action;
pub mod binomial;
pub mod error;
pub mod scheduler;

pub use action::{Action, ActionKind, StepRange};
pub use binomial::{adjust, expense, maxrange, numforw};
pub use error::{ScheduleError, ScheduleResult};
pub use scheduler::{ScheduleSummary, Scheduler};
