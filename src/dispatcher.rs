use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::buffer::Buffer;
use crate::config::MAX_DURATION;
use crate::error::DeliveryError;
use crate::record::LogBatch;
use crate::sink::LogSink;
use crate::stats::Stats;

/// What asked for a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// Periodic scheduler tick.
    Interval,
    /// A `log()` call brought the buffer to the batch size.
    Threshold,
    /// `Logger::flush()`.
    Explicit,
    /// Final flush issued by `close()` or drop.
    Close,
}

impl FlushTrigger {
    /// Forced flushes ignore the retry backoff.
    fn is_forced(self) -> bool {
        matches!(self, FlushTrigger::Explicit | FlushTrigger::Close)
    }
}

/// Exponential delay applied after a failed send.
#[derive(Debug)]
struct Backoff {
    initial: Duration,
    max: Duration,
    failures: u32,
    retry_at: Option<Instant>,
}

impl Backoff {
    fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.min(MAX_DURATION);
        Backoff {
            initial,
            max: max.min(MAX_DURATION).max(initial),
            failures: 0,
            retry_at: None,
        }
    }

    fn is_ready(&self, now: Instant) -> bool {
        self.retry_at.map_or(true, |at| now >= at)
    }

    fn record_failure(&mut self, now: Instant) -> Duration {
        let delay = self
            .initial
            .saturating_mul(2u32.saturating_pow(self.failures.min(20)))
            .min(self.max);
        self.failures = self.failures.saturating_add(1);
        self.retry_at = now.checked_add(delay).or(self.retry_at);
        delay
    }

    fn reset(&mut self) {
        self.failures = 0;
        self.retry_at = None;
    }
}

/// Moves entries from the [`Buffer`] to a [`LogSink`].
///
/// At most one flush cycle runs at a time: the backoff state doubles as
/// the in-flight gate, so a concurrent `flush` waits for the current one
/// and then finds whatever is left (often nothing).
pub struct Dispatcher {
    buffer: Arc<Buffer>,
    sink: Arc<dyn LogSink>,
    project_slug: String,
    batch_size: usize,
    gate: Mutex<Backoff>,
    stats: Arc<Stats>,
}

impl Dispatcher {
    pub(crate) fn new(
        buffer: Arc<Buffer>,
        sink: Arc<dyn LogSink>,
        project_slug: String,
        initial_backoff: Duration,
        max_backoff: Duration,
        stats: Arc<Stats>,
    ) -> Self {
        let batch_size = buffer.threshold();
        Dispatcher {
            buffer,
            sink,
            project_slug,
            batch_size,
            gate: Mutex::new(Backoff::new(initial_backoff, max_backoff)),
            stats,
        }
    }

    /// Run one flush cycle.
    ///
    /// Takes a snapshot of everything pending and sends it in chunks of at
    /// most `batch_size`, stopping at the first failed chunk. The failed
    /// chunk and everything after it go back to the head of the buffer, in
    /// their original order.
    ///
    /// **Returns**
    /// - `Ok(n)` with the number of entries delivered (0 when the buffer
    ///   was empty or a non-forced flush hit the backoff window).
    /// - `Err(..)` with the delivery error of the failed chunk.
    pub async fn flush(&self, trigger: FlushTrigger) -> Result<usize, DeliveryError> {
        let mut backoff = self.gate.lock().await;

        if !trigger.is_forced() && !backoff.is_ready(Instant::now()) {
            debug!(?trigger, "skipping flush during retry backoff");
            return Ok(0);
        }

        let mut pending = self.buffer.snapshot_and_clear();
        let mut delivered = 0;

        while !pending.is_empty() {
            let rest = pending.split_off(self.batch_size.min(pending.len()));
            let payload = LogBatch {
                project_slug: &self.project_slug,
                logs: &pending,
            };
            match self.sink.send_batch(&payload).await {
                Ok(()) => {
                    delivered += pending.len();
                    Stats::incr(&self.stats.delivered, pending.len() as u64);
                    backoff.reset();
                    pending = rest;
                }
                Err(err) => {
                    pending.extend(rest);
                    let count = pending.len();
                    let evicted = self.buffer.requeue_front(pending);
                    let retry_in = backoff.record_failure(Instant::now());
                    Stats::incr(&self.stats.failed_flushes, 1);
                    Stats::incr(&self.stats.requeued, count as u64);
                    warn!(
                        error = %err,
                        ?trigger,
                        requeued = count,
                        evicted,
                        retry_in_ms = retry_in.as_millis() as u64,
                        "failed to deliver log batch"
                    );
                    return Err(err);
                }
            }
        }

        if delivered > 0 {
            debug!(?trigger, delivered, "flushed log batches");
        }
        Ok(delivered)
    }

    /// `true` when no flush cycle currently holds the gate.
    pub(crate) fn is_idle(&self) -> bool {
        self.gate.try_lock().is_ok()
    }
}
