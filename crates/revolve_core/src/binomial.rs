//! Binomial cost functions of the revolve algorithm.
//!
//! With `s` checkpoints and `r` repetitions (the number of times any single
//! step may be evaluated during the reverse sweep) at most
//! `β(s, r) = C(s + r, s)` steps can be reversed. The optimal schedule for
//! `l` steps uses the smallest `r` with `β(s, r) ≥ l`, and performs exactly
//! `r·l − β(s + 1, r − 1)` forward steps.
//!
//! # Reference
//!
//! Griewank, A., & Walther, A. (2000). Algorithm 799: revolve: an
//! implementation of checkpointing for the reverse or adjoint mode of
//! computational differentiation. ACM TOMS 26(1), 19–45.

use crate::error::{ScheduleError, ScheduleResult};

/// Smallest repetition count `r` with `β(checkpoints, r) ≥ steps`, and
/// `β(checkpoints, r)` itself.
#[inline]
fn repetitions(steps: usize, checkpoints: usize) -> (u128, u128) {
    let mut reps: u128 = 0;
    let mut range: u128 = 1;
    while range < steps as u128 {
        reps += 1;
        range = range * (reps + checkpoints as u128) / reps;
    }
    (reps, range)
}

/// Largest number of steps reversible with `checkpoints` snapshots when
/// every step is evaluated at most `reps` times: `C(checkpoints + reps, checkpoints)`.
///
/// Saturates at `usize::MAX`.
///
/// # Examples
///
/// ```
/// use revolve_core::maxrange;
///
/// assert_eq!(maxrange(2, 2), 6);
/// assert_eq!(maxrange(10, 3), 286);
/// assert_eq!(maxrange(5, 0), 1);
/// ```
pub fn maxrange(checkpoints: usize, reps: usize) -> usize {
    let mut range: u128 = 1;
    for i in 1..=reps as u128 {
        range = range * (checkpoints as u128 + i) / i;
        if range > usize::MAX as u128 {
            return usize::MAX;
        }
    }
    range as usize
}

/// Number of forward steps performed by the optimal schedule.
///
/// Counts every `AdvanceForward` step (forward sweep plus recomputation).
/// The forward steps executed inside reverse turns are not included.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidCheckpoints`] when `checkpoints == 0` and
/// [`ScheduleError::RangeOverflow`] if the count does not fit in `usize`.
///
/// # Examples
///
/// ```
/// use revolve_core::numforw;
///
/// // One checkpoint: every reverse step recomputes from step 0.
/// assert_eq!(numforw(5, 1).unwrap(), 10);
/// // Enough checkpoints: no recomputation, steps - 1 advances.
/// assert_eq!(numforw(10, 10).unwrap(), 9);
/// assert_eq!(numforw(100, 10).unwrap(), 222);
/// ```
pub fn numforw(steps: usize, checkpoints: usize) -> ScheduleResult<usize> {
    if checkpoints < 1 {
        return Err(ScheduleError::InvalidCheckpoints(checkpoints));
    }
    let (reps, range) = repetitions(steps, checkpoints);
    let count = reps * steps as u128 - range * reps / (checkpoints as u128 + 1);
    usize::try_from(count).map_err(|_| ScheduleError::RangeOverflow { steps, checkpoints })
}

/// Ratio of forward steps to schedule length, `numforw / steps`.
///
/// Returns `0.0` for an empty schedule.
///
/// # Examples
///
/// ```
/// use revolve_core::expense;
///
/// let ratio = expense(100, 10).unwrap();
/// assert!((ratio - 2.22).abs() < 1e-12);
/// ```
pub fn expense(steps: usize, checkpoints: usize) -> ScheduleResult<f64> {
    let forward = numforw(steps, checkpoints)?;
    if steps == 0 {
        return Ok(0.0);
    }
    Ok(forward as f64 / steps as f64)
}

/// Recommended number of checkpoints for `steps` timesteps.
///
/// Chooses the checkpoint count `s` such that `s` and the repetition count
/// `r` are balanced while `β(s, r) ≥ steps`. Always returns at least one.
///
/// # Examples
///
/// ```
/// use revolve_core::adjust;
///
/// assert_eq!(adjust(1), 1);
/// assert_eq!(adjust(100), 5);
/// assert_eq!(adjust(10_000), 8);
/// ```
pub fn adjust(steps: usize) -> usize {
    if steps < 2 {
        return 1;
    }
    let target = steps as i128;
    let range = |snaps: i64, reps: i64| -> i128 {
        if snaps < 0 || reps < 0 {
            -1
        } else {
            maxrange(snaps as usize, reps as usize) as i128
        }
    };

    let mut snaps: i64 = 1;
    let mut reps: i64 = 1;
    let mut shift: i64 = 0;
    while range(snaps + shift, reps + shift) > target {
        shift -= 1;
    }
    while range(snaps + shift, reps + shift) < target {
        shift += 1;
    }
    snaps += shift;
    reps += shift;

    // Trade snapshots against repetitions until the range drops below target,
    // then undo the last reduction.
    let mut reduced_snaps = None;
    while range(snaps, reps) >= target {
        if snaps > reps {
            snaps -= 1;
            reduced_snaps = Some(true);
        } else {
            reps -= 1;
            reduced_snaps = Some(false);
        }
    }
    if reduced_snaps == Some(true) {
        snaps += 1;
    }
    snaps.max(1) as usize
}

/// Offset from the current forward position at which the next snapshot is
/// placed.
///
/// `free` is the number of checkpoints still available including the one
/// holding the current position, `span` the number of steps left in the
/// window. The offsets follow Algorithm 799: with `r` the repetition count
/// for `(span, free)`, the candidates are `β(free, r-1)` for a long window,
/// `span − β(free-1, r-1) − β(free-2, r-1)` for an intermediate one and
/// `β(free-1, r-2)·…` for a short one. Always returns at least 1.
pub(crate) fn snapshot_offset(free: usize, span: usize) -> usize {
    debug_assert!(free >= 1, "snapshot_offset needs a free checkpoint");
    debug_assert!(span >= 2, "snapshot_offset needs at least two steps");

    let ds = free as u128;
    let (reps, range) = repetitions(span, free);
    let span = span as u128;

    // β(ds, reps-1)
    let bino1 = range * reps / (ds + reps);
    // β(ds-1, reps-1)
    let bino2 = if ds > 1 {
        bino1 * ds / (ds + reps - 1)
    } else {
        1
    };
    // β(ds-2, reps-1)
    let bino3 = if ds == 1 {
        0
    } else if ds > 2 {
        bino2 * (ds - 1) / (ds + reps - 2)
    } else {
        1
    };
    // β(ds-1, reps-2)
    let bino4 = bino2 * (reps - 1) / ds;
    // β(ds-3, reps-1)
    let bino5 = if ds < 3 {
        0
    } else if ds > 3 {
        bino3 * (ds - 2) / reps
    } else {
        1
    };

    let offset = if span <= bino1 + bino3 {
        bino4
    } else if span >= range - bino5 {
        bino1
    } else {
        span - bino2 - bino3
    };
    (offset as usize).max(1)
}
