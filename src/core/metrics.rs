//! Logger metrics for observability
//!
//! Counters for monitoring pipeline health: emitted entries, entries
//! suppressed by the level gate, and transport failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics shared by a root logger and every logger derived from it
///
/// # Example
///
/// ```
/// use rust_structured_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_emitted();
/// metrics.record_transport_failure();
///
/// assert_eq!(metrics.entries_emitted(), 1);
/// assert_eq!(metrics.transport_failures(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Entries that passed the level gate and were fanned out
    entries_emitted: AtomicU64,

    /// Calls rejected by the level gate
    entries_suppressed: AtomicU64,

    /// Transport `log` calls that returned an error
    transport_failures: AtomicU64,

    /// Transport `log` calls that panicked
    transport_panics: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            entries_emitted: AtomicU64::new(0),
            entries_suppressed: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
            transport_panics: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn entries_emitted(&self) -> u64 {
        self.entries_emitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_suppressed(&self) -> u64 {
        self.entries_suppressed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn transport_failures(&self) -> u64 {
        self.transport_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn transport_panics(&self) -> u64 {
        self.transport_panics.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_emitted(&self) -> u64 {
        self.entries_emitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_suppressed(&self) -> u64 {
        self.entries_suppressed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_transport_failure(&self) -> u64 {
        self.transport_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_transport_panic(&self) -> u64 {
        self.transport_panics.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of transport deliveries that failed, as a percentage (0.0 - 100.0).
    ///
    /// `deliveries` is entries emitted times the number of transports;
    /// returns 0.0 when nothing was delivered.
    pub fn failure_rate(&self, transports: usize) -> f64 {
        let deliveries = self.entries_emitted() as f64 * transports as f64;
        if deliveries == 0.0 {
            0.0
        } else {
            let failed = (self.transport_failures() + self.transport_panics()) as f64;
            (failed / deliveries) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.entries_emitted.store(0, Ordering::Relaxed);
        self.entries_suppressed.store(0, Ordering::Relaxed);
        self.transport_failures.store(0, Ordering::Relaxed);
        self.transport_panics.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            entries_emitted: AtomicU64::new(self.entries_emitted()),
            entries_suppressed: AtomicU64::new(self.entries_suppressed()),
            transport_failures: AtomicU64::new(self.transport_failures()),
            transport_panics: AtomicU64::new(self.transport_panics()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.entries_emitted(), 0);
        assert_eq!(metrics.entries_suppressed(), 0);
        assert_eq!(metrics.transport_failures(), 0);
        assert_eq!(metrics.transport_panics(), 0);
    }

    #[test]
    fn test_metrics_record_returns_previous() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_suppressed(), 0);
        assert_eq!(metrics.record_suppressed(), 1);
        assert_eq!(metrics.entries_suppressed(), 2);
    }

    #[test]
    fn test_failure_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.failure_rate(2), 0.0);

        for _ in 0..50 {
            metrics.record_emitted();
        }
        for _ in 0..10 {
            metrics.record_transport_failure();
        }

        // 10 failures out of 50 entries x 2 transports
        let rate = metrics.failure_rate(2);
        assert!((9.9..=10.1).contains(&rate), "Failure rate was {}", rate);
    }

    #[test]
    fn test_metrics_reset_and_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_emitted();
        metrics.record_transport_panic();

        let snapshot = metrics.clone();
        metrics.reset();

        assert_eq!(metrics.entries_emitted(), 0);
        assert_eq!(snapshot.entries_emitted(), 1);
        assert_eq!(snapshot.transport_panics(), 1);
    }
}
