//! Execution engine driving operators and storage through a revolve schedule.
//!
//! A [`Revolver`] owns the simulation state, the caller's collaborators, a
//! [`Scheduler`] and a slot store. [`Revolver::apply_forward`] runs the
//! forward sweep, storing snapshots where the schedule asks for them, and
//! leaves the state at `total_steps`. [`Revolver::apply_reverse`] then runs
//! the reverse operator over every step from last to first, restoring
//! snapshots and recomputing forward steps as needed.
//!
//! # Phases
//!
//! ```text
//! Pending --apply_forward--> Reversible --apply_reverse--> Complete
//!     \____________________ any error ____________________> Failed
//! ```

use std::fmt;

use revolve_core::{adjust, Action, ActionKind, Scheduler, StepRange};
use tracing::{debug, error, info};

use crate::compression::{Codec, CompressionParams, ResolvedCodec};
use crate::config::RevolverConfig;
use crate::error::{ConfigError, RevolverError, RevolverResult};
use crate::operator::{Checkpoint, Operator};
use crate::stats::{timed, RevolverStats};
use crate::storage::{MemoryBudget, MemoryStore, SlotStore};

/// Run phase of a [`Revolver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Forward sweep not started.
    Pending,
    /// Forward sweep done; `pending` is the last step, still to be reversed.
    Reversible {
        /// Step whose reverse operator has not run yet
        pending: Option<usize>,
    },
    /// Reverse sweep done.
    Complete,
    /// An error occurred; no further calls are accepted.
    Failed,
}

impl Phase {
    /// Name used in sequencing errors.
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Pending => "pending",
            Phase::Reversible { .. } => "reversible",
            Phase::Complete => "complete",
            Phase::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Checkpointed forward/reverse executor.
///
/// # Type Parameters
///
/// * `S` - Simulation state
/// * `C` - [`Checkpoint`] converting `S` to and from a [`Field`](crate::Field)
/// * `F` - Forward [`Operator`]
/// * `R` - Reverse [`Operator`]
/// * `T` - [`SlotStore`] holding the payloads
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
///
/// use revolve_core::StepRange;
/// use revolve_engine::{Field, FieldCheckpoint, Revolver};
///
/// let forward = |state: &mut Field, range: StepRange| -> Result<(), Infallible> {
///     state.add_scalar(range.len() as f64);
///     Ok(())
/// };
/// let reverse = |state: &mut Field, range: StepRange| -> Result<(), Infallible> {
///     state.add_scalar(-(range.len() as f64));
///     Ok(())
/// };
///
/// let mut revolver = Revolver::builder(FieldCheckpoint::new(), forward, reverse, Field::zeros(vec![4]))
///     .checkpoints(3)
///     .timesteps(20)
///     .build()
///     .unwrap();
///
/// revolver.apply_forward().unwrap();
/// assert_eq!(revolver.state().values(), &[20.0; 4]);
/// revolver.apply_reverse().unwrap();
/// assert_eq!(revolver.state().values(), &[0.0; 4]);
/// ```
pub struct Revolver<S, C, F, R, T = MemoryStore> {
    checkpoint: C,
    forward: F,
    reverse: R,
    state: S,
    scheduler: Scheduler,
    store: T,
    params: CompressionParams,
    codec: ResolvedCodec,
    phase: Phase,
    last: ActionKind,
    stats: RevolverStats,
}

impl<S, C, F, R> Revolver<S, C, F, R, MemoryStore>
where
    C: Checkpoint<S>,
    F: Operator<S, Error = C::Error>,
    R: Operator<S, Error = C::Error>,
{
    /// Creates a revolver with an in-memory slot store.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidCheckpoints`] if `checkpoints == 0`, or
    /// [`ConfigError::Compression`] if `compression` does not resolve.
    pub fn new(
        checkpoint: C,
        forward: F,
        reverse: R,
        state: S,
        checkpoints: usize,
        total_steps: usize,
        compression: CompressionParams,
    ) -> Result<Self, ConfigError> {
        Self::builder(checkpoint, forward, reverse, state)
            .checkpoints(checkpoints)
            .timesteps(total_steps)
            .compression(compression)
            .build()
    }

    /// Starts building a revolver around the given collaborators.
    pub fn builder(checkpoint: C, forward: F, reverse: R, state: S) -> RevolverBuilder<S, C, F, R> {
        RevolverBuilder {
            checkpoint,
            forward,
            reverse,
            state,
            checkpoints: None,
            total_steps: 0,
            compression: CompressionParams::default(),
            budget: None,
        }
    }
}

impl<S, C, F, R, T> Revolver<S, C, F, R, T>
where
    C: Checkpoint<S>,
    F: Operator<S, Error = C::Error>,
    R: Operator<S, Error = C::Error>,
    T: SlotStore,
{
    /// Current simulation state.
    #[inline]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Mutable simulation state, e.g. to seed the adjoint before the
    /// reverse sweep.
    #[inline]
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Consumes the revolver, returning the simulation state.
    pub fn into_state(self) -> S {
        self.state
    }

    /// Statistics gathered so far.
    #[inline]
    pub fn stats(&self) -> &RevolverStats {
        &self.stats
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Checkpoints held simultaneously at most.
    #[inline]
    pub fn checkpoints_available(&self) -> usize {
        self.scheduler.checkpoints_available()
    }

    /// Forward timesteps.
    #[inline]
    pub fn total_steps(&self) -> usize {
        self.scheduler.total_steps()
    }

    /// Compression parameters in use.
    #[inline]
    pub fn compression(&self) -> &CompressionParams {
        &self.params
    }

    /// Slot store.
    #[inline]
    pub fn store(&self) -> &T {
        &self.store
    }

    /// Runs the forward sweep, leaving the state at `total_steps`.
    ///
    /// # Errors
    ///
    /// [`RevolverError::Sequence`] unless the revolver is pending; otherwise
    /// the first error raised by a collaborator, the codec or the store.
    pub fn apply_forward(&mut self) -> RevolverResult<(), C::Error> {
        if self.phase != Phase::Pending {
            return Err(self.out_of_sequence("pending"));
        }
        info!(
            checkpoints = self.checkpoints_available(),
            timesteps = self.total_steps(),
            scheme = %self.params.scheme,
            "forward sweep started"
        );
        let result = self.forward_sweep();
        self.settle(result)?;
        info!(
            forward_steps = self.stats.forward_steps,
            snapshots = self.stats.snapshots,
            stored_bytes = self.store.stored_bytes(),
            "forward sweep complete"
        );
        Ok(())
    }

    /// Runs the reverse sweep back to timestep 0, then releases every stored
    /// snapshot.
    ///
    /// # Errors
    ///
    /// [`RevolverError::Sequence`] unless [`apply_forward`](Self::apply_forward)
    /// completed and this is the first call; otherwise the first error raised
    /// by a collaborator, the codec or the store.
    pub fn apply_reverse(&mut self) -> RevolverResult<(), C::Error> {
        let pending = match self.phase {
            Phase::Reversible { pending } => pending,
            _ => return Err(self.out_of_sequence("reversible")),
        };
        let result = self.reverse_sweep(pending);
        self.settle(result)?;
        self.store.clear();
        info!(
            reverse_steps = self.stats.reverse_steps,
            recomputed_steps = self.stats.recomputed_steps,
            restores = self.stats.restores,
            "reverse sweep complete"
        );
        Ok(())
    }

    fn forward_sweep(&mut self) -> RevolverResult<(), C::Error> {
        loop {
            match self.next_action()? {
                Action::AdvanceReverse { timestep, .. } => {
                    // Last forward step; its reverse runs in apply_reverse.
                    self.run_forward(StepRange::single(timestep), false)?;
                    self.phase = Phase::Reversible {
                        pending: Some(timestep),
                    };
                    return Ok(());
                }
                Action::Terminate => {
                    self.phase = Phase::Reversible { pending: None };
                    return Ok(());
                }
                action => self.execute(action, false)?,
            }
        }
    }

    fn reverse_sweep(&mut self, pending: Option<usize>) -> RevolverResult<(), C::Error> {
        match pending {
            Some(timestep) => self.run_reverse(timestep)?,
            None => {
                // Empty schedule: Terminate was already consumed.
                self.phase = Phase::Complete;
                return Ok(());
            }
        }
        loop {
            match self.next_action()? {
                Action::AdvanceReverse { timestep, .. } => {
                    self.run_forward(StepRange::single(timestep), false)?;
                    self.run_reverse(timestep)?;
                }
                Action::Terminate => {
                    self.phase = Phase::Complete;
                    return Ok(());
                }
                action => self.execute(action, true)?,
            }
        }
    }

    fn next_action(&mut self) -> RevolverResult<Action, C::Error> {
        let action = self
            .scheduler
            .next_action()
            .map_err(|source| RevolverError::Schedule {
                action: self.last,
                timestep: self.scheduler.position(),
                source,
            })?;
        debug!(action = %action.kind(), timestep = ?action.timestep(), "executing");
        self.last = action.kind();
        Ok(action)
    }

    /// Runs a snapshot, restore or advance; `reversing` marks advances as
    /// recomputation.
    fn execute(&mut self, action: Action, reversing: bool) -> RevolverResult<(), C::Error> {
        match action {
            Action::AdvanceForward { start, end } => {
                self.run_forward(StepRange::new(start, end), reversing)
            }
            Action::TakeSnapshot { slot, timestep } => self.take_snapshot(slot, timestep),
            Action::Restore { slot, timestep } => self.restore(slot, timestep),
            Action::AdvanceReverse { .. } | Action::Terminate => Ok(()),
        }
    }

    fn run_forward(&mut self, range: StepRange, recompute: bool) -> RevolverResult<(), C::Error> {
        let (forward, state) = (&mut self.forward, &mut self.state);
        timed(&mut self.stats.forward_time, || forward.apply(state, range))
            .map_err(RevolverError::Collaborator)?;
        self.stats.forward_steps += range.len();
        if recompute {
            self.stats.recomputed_steps += range.len();
        }
        Ok(())
    }

    fn run_reverse(&mut self, timestep: usize) -> RevolverResult<(), C::Error> {
        let (reverse, state) = (&mut self.reverse, &mut self.state);
        timed(&mut self.stats.reverse_time, || {
            reverse.apply(state, StepRange::single(timestep))
        })
        .map_err(RevolverError::Collaborator)?;
        self.stats.reverse_steps += 1;
        Ok(())
    }

    fn take_snapshot(&mut self, slot: usize, timestep: usize) -> RevolverResult<(), C::Error> {
        let capacity = self.scheduler.checkpoints_available();
        if slot >= capacity {
            return Err(RevolverError::BudgetViolation {
                slot,
                capacity,
                timestep,
            });
        }

        let (checkpoint, state) = (&mut self.checkpoint, &self.state);
        let field = timed(&mut self.stats.checkpoint_time, || {
            checkpoint.save(timestep, state)
        })
        .map_err(RevolverError::Collaborator)?;

        let (codec, params) = (&self.codec, &self.params);
        let payload = timed(&mut self.stats.compress_time, || {
            codec.compress(params, &field)
        })
        .map_err(|source| RevolverError::Compression {
            action: ActionKind::TakeSnapshot,
            timestep,
            source,
        })?;
        self.stats.compressions += 1;

        let raw = field.memory_size();
        let encoded = payload.size_bytes();
        self.store
            .store(slot, timestep, payload)
            .map_err(|source| RevolverError::Storage {
                action: ActionKind::TakeSnapshot,
                timestep,
                source,
            })?;

        self.stats.snapshots += 1;
        self.stats.raw_bytes += raw;
        self.stats.encoded_bytes += encoded;
        self.stats.peak_stored_bytes = self.stats.peak_stored_bytes.max(self.store.stored_bytes());
        debug!(slot, timestep, raw, encoded, "snapshot stored");
        Ok(())
    }

    fn restore(&mut self, slot: usize, timestep: usize) -> RevolverResult<(), C::Error> {
        let stored = self
            .store
            .fetch(slot)
            .filter(|stored| stored.timestep == timestep)
            .ok_or(RevolverError::EmptySlot { slot, timestep })?;

        let (codec, params) = (&self.codec, &self.params);
        let field = timed(&mut self.stats.decompress_time, || {
            codec.decompress(params, &stored.payload)
        })
        .map_err(|source| RevolverError::Compression {
            action: ActionKind::Restore,
            timestep,
            source,
        })?;
        self.stats.decompressions += 1;

        let (checkpoint, state) = (&mut self.checkpoint, &mut self.state);
        timed(&mut self.stats.checkpoint_time, || {
            checkpoint.load(timestep, &field, state)
        })
        .map_err(RevolverError::Collaborator)?;
        self.stats.restores += 1;
        Ok(())
    }

    fn out_of_sequence(&self, expected: &'static str) -> RevolverError<C::Error> {
        error!(expected, found = self.phase.name(), "revolver called out of sequence");
        RevolverError::Sequence {
            expected,
            found: self.phase.name(),
        }
    }

    /// Moves to `Failed` on error.
    fn settle(&mut self, result: RevolverResult<(), C::Error>) -> RevolverResult<(), C::Error> {
        if result.is_err() {
            error!(
                action = %self.last,
                timestep = self.scheduler.position(),
                "revolver failed"
            );
            self.phase = Phase::Failed;
        }
        result
    }
}

/// Builder for [`Revolver`].
///
/// Unset values default to: `checkpoints` = [`adjust(timesteps)`](revolve_core::adjust),
/// `timesteps` = 0, no compression, unbounded memory.
pub struct RevolverBuilder<S, C, F, R> {
    checkpoint: C,
    forward: F,
    reverse: R,
    state: S,
    checkpoints: Option<usize>,
    total_steps: usize,
    compression: CompressionParams,
    budget: Option<MemoryBudget>,
}

impl<S, C, F, R> RevolverBuilder<S, C, F, R>
where
    C: Checkpoint<S>,
    F: Operator<S, Error = C::Error>,
    R: Operator<S, Error = C::Error>,
{
    /// Sets the number of checkpoints held simultaneously.
    pub fn checkpoints(mut self, checkpoints: usize) -> Self {
        self.checkpoints = Some(checkpoints);
        self
    }

    /// Sets the number of forward timesteps.
    pub fn timesteps(mut self, total_steps: usize) -> Self {
        self.total_steps = total_steps;
        self
    }

    /// Sets the compression parameters.
    pub fn compression(mut self, compression: CompressionParams) -> Self {
        self.compression = compression;
        self
    }

    /// Bounds the bytes held by the in-memory store.
    pub fn memory_budget(mut self, budget: MemoryBudget) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Applies a loaded configuration.
    pub fn config(self, config: &RevolverConfig) -> Result<Self, ConfigError> {
        let compression = config.compression.to_params()?;
        let mut builder = self.timesteps(config.timesteps).compression(compression);
        builder.checkpoints = config.checkpoints;
        Ok(builder)
    }

    fn resolved_checkpoints(&self) -> Result<usize, ConfigError> {
        match self.checkpoints {
            Some(0) => Err(ConfigError::InvalidCheckpoints(0)),
            Some(n) => Ok(n),
            None => Ok(adjust(self.total_steps)),
        }
    }

    /// Builds a revolver with an in-memory store of `checkpoints` slots.
    pub fn build(self) -> Result<Revolver<S, C, F, R>, ConfigError> {
        let checkpoints = self.resolved_checkpoints()?;
        let mut store = MemoryStore::new(checkpoints);
        if let Some(budget) = self.budget {
            store = store.with_budget(budget);
        }
        self.build_with_store(store)
    }

    /// Builds a revolver around a caller-supplied store.
    ///
    /// # Errors
    ///
    /// [`ConfigError::StoreCapacity`] if the store has fewer slots than
    /// checkpoints.
    pub fn build_with_store<T: SlotStore>(
        self,
        store: T,
    ) -> Result<Revolver<S, C, F, R, T>, ConfigError> {
        let checkpoints = self.resolved_checkpoints()?;
        if store.capacity() < checkpoints {
            return Err(ConfigError::StoreCapacity {
                capacity: store.capacity(),
                checkpoints,
            });
        }
        let scheduler = Scheduler::new(checkpoints, self.total_steps)
            .map_err(|_| ConfigError::InvalidCheckpoints(checkpoints))?;
        let codec = self.compression.resolve()?;
        debug!(
            checkpoints,
            timesteps = self.total_steps,
            codec = codec.name(),
            "revolver configured"
        );

        Ok(Revolver {
            checkpoint: self.checkpoint,
            forward: self.forward,
            reverse: self.reverse,
            state: self.state,
            scheduler,
            store,
            params: self.compression,
            codec,
            phase: Phase::Pending,
            last: ActionKind::Terminate,
            stats: RevolverStats::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::{CompressionError, Scheme};
    use crate::field::Field;
    use crate::operator::FieldCheckpoint;
    use crate::storage::StoreError;
    use std::convert::Infallible;

    type Step = fn(&mut Field, StepRange) -> Result<(), Infallible>;

    fn increment(state: &mut Field, range: StepRange) -> Result<(), Infallible> {
        state.add_scalar(range.len() as f64);
        Ok(())
    }

    fn decrement(state: &mut Field, range: StepRange) -> Result<(), Infallible> {
        state.add_scalar(-(range.len() as f64));
        Ok(())
    }

    fn revolver(checkpoints: usize, steps: usize) -> Revolver<Field, FieldCheckpoint, Step, Step> {
        Revolver::new(
            FieldCheckpoint::new(),
            increment as Step,
            decrement as Step,
            Field::zeros(vec![3]),
            checkpoints,
            steps,
            CompressionParams::none(),
        )
        .unwrap()
    }

    // ========================================================================
    // Construction Tests
    // ========================================================================

    #[test]
    fn test_new_rejects_zero_checkpoints() {
        let result = Revolver::new(
            FieldCheckpoint::new(),
            increment as Step,
            decrement as Step,
            Field::zeros(vec![1]),
            0,
            10,
            CompressionParams::none(),
        );
        assert!(matches!(result, Err(ConfigError::InvalidCheckpoints(0))));
    }

    #[test]
    fn test_builder_defaults_checkpoints_to_adjust() {
        let revolver = Revolver::builder(
            FieldCheckpoint::new(),
            increment as Step,
            decrement as Step,
            Field::zeros(vec![1]),
        )
        .timesteps(100)
        .build()
        .unwrap();
        assert_eq!(revolver.checkpoints_available(), 5);
        assert_eq!(revolver.store().capacity(), 5);
        assert_eq!(revolver.phase(), Phase::Pending);
    }

    #[test]
    fn test_builder_rejects_custom_without_codec() {
        let result = Revolver::builder(
            FieldCheckpoint::new(),
            increment as Step,
            decrement as Step,
            Field::zeros(vec![1]),
        )
        .checkpoints(2)
        .timesteps(4)
        .compression(CompressionParams::new(Scheme::Custom))
        .build();
        assert!(matches!(
            result,
            Err(ConfigError::Compression(CompressionError::MissingCustomCodec))
        ));
    }

    #[test]
    fn test_build_with_small_store_fails() {
        let result = Revolver::builder(
            FieldCheckpoint::new(),
            increment as Step,
            decrement as Step,
            Field::zeros(vec![1]),
        )
        .checkpoints(4)
        .timesteps(10)
        .build_with_store(MemoryStore::new(2));
        assert!(matches!(
            result,
            Err(ConfigError::StoreCapacity {
                capacity: 2,
                checkpoints: 4
            })
        ));
    }

    #[test]
    fn test_snapshot_beyond_checkpoints_violates_budget() {
        let mut revolver = Revolver::builder(
            FieldCheckpoint::new(),
            increment as Step,
            decrement as Step,
            Field::zeros(vec![1]),
        )
        .checkpoints(2)
        .timesteps(10)
        .build_with_store(MemoryStore::new(8))
        .unwrap();

        // The store has room, the schedule's budget does not.
        let err = revolver.take_snapshot(2, 0).unwrap_err();
        assert!(matches!(
            err,
            RevolverError::BudgetViolation {
                slot: 2,
                capacity: 2,
                timestep: 0
            }
        ));
        assert_eq!(revolver.store().occupied(), 0);
    }

    // ========================================================================
    // Sweep Tests
    // ========================================================================

    #[test]
    fn test_forward_then_reverse() {
        let mut revolver = revolver(3, 10);
        revolver.apply_forward().unwrap();
        assert_eq!(revolver.state().values(), &[10.0; 3]);
        assert!(matches!(
            revolver.phase(),
            Phase::Reversible { pending: Some(9) }
        ));

        assert!(revolver.store().stored_bytes() > 0);

        revolver.apply_reverse().unwrap();
        assert_eq!(revolver.state().values(), &[0.0; 3]);
        assert_eq!(revolver.phase(), Phase::Complete);
        assert_eq!(revolver.store().occupied(), 0);
        assert_eq!(revolver.store().stored_bytes(), 0);

        let stats = revolver.stats();
        assert_eq!(stats.reverse_steps, 10);
        assert_eq!(stats.snapshots, 6);
        assert_eq!(stats.restores, 9);
        assert_eq!(stats.compressions, stats.snapshots);
        assert_eq!(stats.decompressions, stats.restores);
    }

    #[test]
    fn test_zero_steps_calls_nothing() {
        let mut revolver = revolver(2, 0);
        revolver.apply_forward().unwrap();
        assert_eq!(revolver.phase(), Phase::Reversible { pending: None });
        revolver.apply_reverse().unwrap();
        assert_eq!(revolver.phase(), Phase::Complete);
        assert_eq!(revolver.stats(), &RevolverStats::default());
        assert_eq!(revolver.into_state().values(), &[0.0; 3]);
    }

    #[test]
    fn test_ample_checkpoints_never_recompute() {
        let mut revolver = revolver(20, 15);
        revolver.apply_forward().unwrap();
        revolver.apply_reverse().unwrap();
        // 14 advances, then one forward step per reverse step.
        assert_eq!(revolver.stats().recomputed_steps, 0);
        assert_eq!(revolver.stats().forward_steps, 14 + 15);
    }

    // ========================================================================
    // Sequencing Tests
    // ========================================================================

    #[test]
    fn test_reverse_before_forward_fails() {
        let mut revolver = revolver(2, 5);
        let err = revolver.apply_reverse().unwrap_err();
        assert!(matches!(
            err,
            RevolverError::Sequence {
                expected: "reversible",
                found: "pending"
            }
        ));
    }

    #[test]
    fn test_forward_twice_fails() {
        let mut revolver = revolver(2, 5);
        revolver.apply_forward().unwrap();
        assert!(matches!(
            revolver.apply_forward(),
            Err(RevolverError::Sequence {
                expected: "pending",
                ..
            })
        ));
    }

    #[test]
    fn test_reverse_twice_fails() {
        let mut revolver = revolver(2, 5);
        revolver.apply_forward().unwrap();
        revolver.apply_reverse().unwrap();
        assert!(matches!(
            revolver.apply_reverse(),
            Err(RevolverError::Sequence {
                found: "complete",
                ..
            })
        ));
    }

    #[test]
    fn test_storage_failure_marks_failed() {
        let mut revolver = Revolver::builder(
            FieldCheckpoint::new(),
            increment as Step,
            decrement as Step,
            Field::zeros(vec![100]),
        )
        .checkpoints(3)
        .timesteps(10)
        .memory_budget(MemoryBudget::new(1000))
        .build()
        .unwrap();

        let err = revolver.apply_forward().unwrap_err();
        assert!(matches!(
            err,
            RevolverError::Storage {
                action: ActionKind::TakeSnapshot,
                timestep: 4,
                source: StoreError::MemoryExceeded { .. }
            }
        ));
        assert_eq!(revolver.phase(), Phase::Failed);
        assert!(matches!(
            revolver.apply_reverse(),
            Err(RevolverError::Sequence {
                found: "failed",
                ..
            })
        ));
    }
}
