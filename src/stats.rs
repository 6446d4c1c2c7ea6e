use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the logger handle and its dispatcher.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    pub accepted: AtomicU64,
    pub rejected: AtomicU64,
    pub delivered: AtomicU64,
    pub failed_flushes: AtomicU64,
    pub requeued: AtomicU64,
}

impl Stats {
    pub fn incr(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, dropped: u64) -> LoggerStats {
        LoggerStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed_flushes: self.failed_flushes.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            dropped,
        }
    }
}

/// Point-in-time view of a logger's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerStats {
    /// Entries accepted into the buffer by `log()`.
    pub accepted: u64,
    /// `log()` calls rejected (logger closed, empty message).
    pub rejected: u64,
    /// Entries acknowledged by the collector.
    pub delivered: u64,
    /// Batches that failed to send.
    pub failed_flushes: u64,
    /// Entries returned to the buffer after a failed send.
    pub requeued: u64,
    /// Entries evicted because the buffer was at capacity.
    pub dropped: u64,
}
