//! Collaborator interfaces driven by the [`Revolver`](crate::Revolver).
//!
//! - [`Operator`]: advances (forward) or back-propagates (reverse) the
//!   simulation state over a [`StepRange`].
//! - [`Checkpoint`]: converts the live state to a [`Field`] and back.
//!
//! Both traits share one error type per run; the revolver returns it
//! unchanged as [`RevolverError::Collaborator`](crate::RevolverError::Collaborator).

use std::convert::Infallible;
use std::marker::PhantomData;

use revolve_core::StepRange;

use crate::field::Field;

/// Forward or reverse step function.
///
/// Operators are replayed: the same range may be applied several times
/// after the state has been restored from a checkpoint, and must produce
/// the same result each time.
///
/// Closures `FnMut(&mut S, StepRange) -> Result<(), E>` implement this
/// trait directly.
///
/// # Examples
///
/// ```
/// use revolve_core::StepRange;
/// use revolve_engine::Operator;
///
/// let mut forward = |state: &mut f64, range: StepRange| -> Result<(), String> {
///     *state += range.len() as f64;
///     Ok(())
/// };
/// let mut state = 0.0;
/// forward.apply(&mut state, StepRange::new(0, 3)).unwrap();
/// assert_eq!(state, 3.0);
/// ```
pub trait Operator<S> {
    /// Error raised by the operator.
    type Error;

    /// Applies the operator to the steps in `range`.
    fn apply(&mut self, state: &mut S, range: StepRange) -> Result<(), Self::Error>;
}

impl<S, E, F> Operator<S> for F
where
    F: FnMut(&mut S, StepRange) -> Result<(), E>,
{
    type Error = E;

    #[inline]
    fn apply(&mut self, state: &mut S, range: StepRange) -> Result<(), E> {
        self(state, range)
    }
}

/// Conversion between the live simulation state and a storable [`Field`].
pub trait Checkpoint<S> {
    /// Error raised while saving or loading.
    type Error;

    /// Captures the state at `timestep`.
    fn save(&mut self, timestep: usize, state: &S) -> Result<Field, Self::Error>;

    /// Overwrites the state with the snapshot taken at `timestep`.
    fn load(&mut self, timestep: usize, field: &Field, state: &mut S) -> Result<(), Self::Error>;
}

/// Checkpoint for states that already are a [`Field`].
///
/// `E` only fixes the error type shared with the operators; this checkpoint
/// never fails.
pub struct FieldCheckpoint<E = Infallible> {
    _error: PhantomData<fn() -> E>,
}

impl<E> FieldCheckpoint<E> {
    /// Creates the checkpoint.
    pub fn new() -> Self {
        Self {
            _error: PhantomData,
        }
    }
}

impl<E> Default for FieldCheckpoint<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for FieldCheckpoint<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldCheckpoint")
    }
}

impl<E> Checkpoint<Field> for FieldCheckpoint<E> {
    type Error = E;

    fn save(&mut self, _timestep: usize, state: &Field) -> Result<Field, E> {
        Ok(state.clone())
    }

    fn load(&mut self, _timestep: usize, field: &Field, state: &mut Field) -> Result<(), E> {
        state.clone_from(field);
        Ok(())
    }
}
