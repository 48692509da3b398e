//! Run statistics collected by the revolver.

use std::fmt;
use std::time::{Duration, Instant};

/// Counters and timings of a revolver run.
///
/// Step counts are in timesteps, byte counts refer to payloads handed to the
/// slot store. Timings are wall-clock time spent inside each collaborator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RevolverStats {
    /// Timesteps executed by the forward operator, turns included
    pub forward_steps: usize,

    /// Forward timesteps executed after the first reverse step
    pub recomputed_steps: usize,

    /// Timesteps executed by the reverse operator
    pub reverse_steps: usize,

    /// Snapshots stored
    pub snapshots: usize,

    /// Snapshots restored
    pub restores: usize,

    /// Calls to the codec's compressor
    pub compressions: usize,

    /// Calls to the codec's decompressor
    pub decompressions: usize,

    /// Uncompressed bytes of all stored fields
    pub raw_bytes: usize,

    /// Payload bytes of all stored snapshots
    pub encoded_bytes: usize,

    /// Largest number of payload bytes held at once
    pub peak_stored_bytes: usize,

    /// Time in the forward operator
    pub forward_time: Duration,

    /// Time in the reverse operator
    pub reverse_time: Duration,

    /// Time in `Checkpoint::save` and `Checkpoint::load`
    pub checkpoint_time: Duration,

    /// Time in the compressor
    pub compress_time: Duration,

    /// Time in the decompressor
    pub decompress_time: Duration,
}

impl RevolverStats {
    /// Ratio of uncompressed to stored bytes, `None` before any snapshot.
    pub fn compression_ratio(&self) -> Option<f64> {
        if self.encoded_bytes == 0 {
            return None;
        }
        Some(self.raw_bytes as f64 / self.encoded_bytes as f64)
    }

    /// Total time spent inside collaborators and the codec.
    pub fn total_time(&self) -> Duration {
        self.forward_time
            + self.reverse_time
            + self.checkpoint_time
            + self.compress_time
            + self.decompress_time
    }
}

impl fmt::Display for RevolverStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "forward steps   {:>10} ({} recomputed)",
            self.forward_steps, self.recomputed_steps
        )?;
        writeln!(f, "reverse steps   {:>10}", self.reverse_steps)?;
        writeln!(
            f,
            "snapshots       {:>10} ({} restores)",
            self.snapshots, self.restores
        )?;
        match self.compression_ratio() {
            Some(ratio) => writeln!(
                f,
                "stored bytes    {:>10} ({:.2}x, peak {})",
                self.encoded_bytes, ratio, self.peak_stored_bytes
            )?,
            None => writeln!(f, "stored bytes    {:>10}", 0)?,
        }
        write!(
            f,
            "time            {:>10.3?} (forward {:.3?}, reverse {:.3?}, codec {:.3?})",
            self.total_time(),
            self.forward_time,
            self.reverse_time,
            self.compress_time + self.decompress_time
        )
    }
}

/// Runs `f`, adding its wall-clock time to `slot`.
#[inline]
pub(crate) fn timed<T>(slot: &mut Duration, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    *slot += start.elapsed();
    result
}
