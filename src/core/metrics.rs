//! Dispatch loop metrics for observability
//!
//! Counters for one (logger, handler) pair: how many records were queued,
//! how many the handler wrote or failed on, and how often a producer had to
//! wait for queue space.

use std::sync::atomic::{AtomicU64, Ordering};

/// # Example
///
/// ```
/// use rust_rotating_logger::DispatchMetrics;
///
/// let metrics = DispatchMetrics::new();
/// metrics.record_submitted();
/// metrics.record_handled();
///
/// assert_eq!(metrics.submitted(), 1);
/// assert_eq!(metrics.pending(), 0);
/// ```
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Records accepted into the queue
    submitted: AtomicU64,

    /// Records the handler processed without error
    handled: AtomicU64,

    /// Records whose handling returned an error or panicked
    failed: AtomicU64,

    /// Submissions that found the queue full and had to wait
    blocked: AtomicU64,
}

impl DispatchMetrics {
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            handled: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn blocked(&self) -> u64 {
        self.blocked.load(Ordering::Relaxed)
    }

    /// Records queued but not yet processed
    pub fn pending(&self) -> u64 {
        self.submitted()
            .saturating_sub(self.handled() + self.failed())
    }

    #[inline]
    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_handled(&self) {
        self.handled.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }

    /// Failure percentage over processed records
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed();
        let processed = failed + self.handled();
        if processed == 0 {
            0.0
        } else {
            (failed as f64 / processed as f64) * 100.0
        }
    }
}
