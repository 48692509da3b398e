//! Byte budget for stored checkpoint payloads.
//!
//! The number of slots is fixed by the schedule; this budget bounds the
//! bytes those slots occupy, which depends on the field size and on how well
//! the configured codec compresses it.

/// Memory budget for checkpoint payloads.
///
/// # Example
///
/// ```rust
/// use revolve_engine::storage::MemoryBudget;
///
/// let budget = MemoryBudget::from_mb(64).with_warning_threshold(0.5);
/// assert!(budget.is_within_budget(1024));
/// assert!(!budget.is_warning(1024));
/// assert!(budget.is_warning(40 * 1024 * 1024));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemoryBudget {
    /// Maximum payload bytes held at once
    max_bytes: usize,

    /// Warning threshold as a fraction (0.0 to 1.0)
    warning_threshold: f64,
}

impl MemoryBudget {
    /// Creates a budget of `max_bytes` with a warning threshold of 80%.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            warning_threshold: 0.8,
        }
    }

    /// Creates a budget from megabytes.
    #[inline]
    pub fn from_mb(mb: usize) -> Self {
        Self::new(mb.saturating_mul(1024 * 1024))
    }

    /// Creates a budget from gigabytes.
    #[inline]
    pub fn from_gb(gb: usize) -> Self {
        Self::new(gb.saturating_mul(1024 * 1024 * 1024))
    }

    /// Sets the warning threshold as a fraction of the maximum.
    ///
    /// # Panics
    ///
    /// Panics if threshold is not in [0.0, 1.0].
    pub fn with_warning_threshold(mut self, threshold: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&threshold),
            "Warning threshold must be between 0.0 and 1.0"
        );
        self.warning_threshold = threshold;
        self
    }

    /// Maximum bytes.
    #[inline]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Warning threshold.
    #[inline]
    pub fn warning_threshold(&self) -> f64 {
        self.warning_threshold
    }

    /// Returns true if `usage` fits in the budget.
    #[inline]
    pub fn is_within_budget(&self, usage: usize) -> bool {
        usage <= self.max_bytes
    }

    /// Returns true if `usage` exceeds the warning threshold.
    #[inline]
    pub fn is_warning(&self, usage: usize) -> bool {
        let threshold_bytes = (self.max_bytes as f64 * self.warning_threshold) as usize;
        usage > threshold_bytes
    }
}

impl Default for MemoryBudget {
    /// 1 GB budget.
    fn default() -> Self {
        Self::from_gb(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_constructors() {
        assert_eq!(MemoryBudget::new(500).max_bytes(), 500);
        assert_eq!(MemoryBudget::from_mb(2).max_bytes(), 2 * 1024 * 1024);
        assert_eq!(MemoryBudget::default().max_bytes(), 1024 * 1024 * 1024);
        assert_eq!(MemoryBudget::new(1).warning_threshold(), 0.8);
    }

    #[test]
    fn test_budget_within_and_warning() {
        let budget = MemoryBudget::new(1000);
        assert!(budget.is_within_budget(1000));
        assert!(!budget.is_within_budget(1001));
        assert!(!budget.is_warning(800));
        assert!(budget.is_warning(801));
    }

    #[test]
    #[should_panic(expected = "Warning threshold")]
    fn test_budget_rejects_bad_threshold() {
        let _ = MemoryBudget::new(10).with_warning_threshold(1.5);
    }
}
