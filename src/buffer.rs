use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::LogError;
use crate::record::LogEntry;

/// Ordered, mutex-guarded store of entries waiting to be shipped.
///
/// Every mutation happens under one lock, so an entry is either in the
/// buffer or in exactly one batch taken from it. Capacity is bounded: when
/// an append or a requeue pushes the length past `capacity`, the oldest
/// entries are evicted and counted as dropped.
pub struct Buffer {
    inner: Mutex<State>,
    threshold: usize,
    capacity: usize,
}

struct State {
    entries: VecDeque<LogEntry>,
    sealed: bool,
    dropped: u64,
}

impl Buffer {
    pub fn new(threshold: usize, capacity: usize) -> Self {
        let threshold = threshold.max(1);
        Buffer {
            inner: Mutex::new(State {
                entries: VecDeque::with_capacity(threshold),
                sealed: false,
                dropped: 0,
            }),
            threshold,
            capacity: capacity.max(threshold),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an entry at the tail.
    ///
    /// **Returns**
    /// - `Ok(true)` if the buffer now holds at least `threshold` entries.
    /// - `Ok(false)` otherwise.
    /// - `Err(LogError::Closed)` once the buffer has been sealed.
    pub fn append(&self, entry: LogEntry) -> Result<bool, LogError> {
        let mut state = self.lock();
        if state.sealed {
            return Err(LogError::Closed);
        }
        state.entries.push_back(entry);
        state.evict_over(self.capacity);
        Ok(state.entries.len() >= self.threshold)
    }

    /// Take every buffered entry, leaving the buffer empty.
    pub fn snapshot_and_clear(&self) -> Vec<LogEntry> {
        let mut state = self.lock();
        state.entries.drain(..).collect()
    }

    /// Put a failed batch back at the head, ahead of anything appended
    /// since it was taken. Returns how many entries were evicted to stay
    /// within capacity.
    pub fn requeue_front(&self, batch: Vec<LogEntry>) -> usize {
        let mut state = self.lock();
        for entry in batch.into_iter().rev() {
            state.entries.push_front(entry);
        }
        state.evict_over(self.capacity)
    }

    /// Refuse further appends. Requeues are still accepted.
    pub fn seal(&self) {
        self.lock().sealed = true;
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Entries evicted over the buffer's lifetime.
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

impl State {
    // drop-oldest
    fn evict_over(&mut self, capacity: usize) -> usize {
        let excess = self.entries.len().saturating_sub(capacity);
        if excess > 0 {
            self.entries.drain(..excess);
            self.dropped += excess as u64;
            tracing::warn!(evicted = excess, capacity, "log buffer full, dropping oldest entries");
        }
        excess
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    fn entry(msg: &str) -> LogEntry {
        LogEntry::build(Level::Info, msg, "test", None, &[]).unwrap()
    }

    fn messages(entries: &[LogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.message()).collect()
    }

    #[test]
    fn append_reports_threshold() {
        let buffer = Buffer::new(3, 100);
        assert_eq!(buffer.append(entry("a")), Ok(false));
        assert_eq!(buffer.append(entry("b")), Ok(false));
        assert_eq!(buffer.append(entry("c")), Ok(true));
        assert_eq!(buffer.append(entry("d")), Ok(true));
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn snapshot_empties_buffer_in_order() {
        let buffer = Buffer::new(10, 100);
        for m in ["a", "b", "c"] {
            buffer.append(entry(m)).unwrap();
        }
        let snapshot = buffer.snapshot_and_clear();
        assert_eq!(messages(&snapshot), ["a", "b", "c"]);
        assert!(buffer.is_empty());
        assert!(buffer.snapshot_and_clear().is_empty());
    }

    #[test]
    fn requeue_goes_ahead_of_newer_entries() {
        let buffer = Buffer::new(10, 100);
        buffer.append(entry("a")).unwrap();
        buffer.append(entry("b")).unwrap();
        let batch = buffer.snapshot_and_clear();
        buffer.append(entry("c")).unwrap();

        assert_eq!(buffer.requeue_front(batch), 0);
        assert_eq!(messages(&buffer.snapshot_and_clear()), ["a", "b", "c"]);
    }

    #[test]
    fn overflow_evicts_oldest() {
        let buffer = Buffer::new(2, 3);
        for m in ["a", "b"] {
            buffer.append(entry(m)).unwrap();
        }
        let batch = buffer.snapshot_and_clear();
        for m in ["c", "d"] {
            buffer.append(entry(m)).unwrap();
        }

        assert_eq!(buffer.requeue_front(batch), 1);
        assert_eq!(buffer.dropped(), 1);
        assert_eq!(messages(&buffer.snapshot_and_clear()), ["b", "c", "d"]);
    }

    #[test]
    fn sealed_buffer_rejects_appends_but_takes_requeues() {
        let buffer = Buffer::new(10, 100);
        buffer.append(entry("a")).unwrap();
        let batch = buffer.snapshot_and_clear();
        buffer.seal();

        assert_eq!(buffer.append(entry("b")), Err(LogError::Closed));
        buffer.requeue_front(batch);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let buffer = std::sync::Arc::new(Buffer::new(1_000, 10_000));
        std::thread::scope(|s| {
            for t in 0..4 {
                let buffer = buffer.clone();
                s.spawn(move || {
                    for i in 0..250 {
                        buffer.append(entry(&format!("{t}-{i}"))).unwrap();
                    }
                });
            }
        });
        assert_eq!(buffer.len(), 1_000);
    }
}
