use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::MAX_DURATION;
use crate::dispatcher::{Dispatcher, FlushTrigger};

/// Background task driving time-based and threshold flushes.
///
/// Ticks at a fixed cadence: the first flush happens one `interval` after
/// spawning, then every `interval` regardless of traffic. `log()` never
/// re-arms the timer; when a call fills a batch it only pokes `wake`,
/// and the flush runs here rather than on the caller's thread.
pub struct FlushScheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl FlushScheduler {
    pub fn spawn(
        runtime: &Handle,
        dispatcher: Arc<Dispatcher>,
        interval: Duration,
        wake: Arc<Notify>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let interval = interval.min(MAX_DURATION);

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // A flush in progress is always finished before the
                // cancellation is observed.
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let _ = dispatcher.flush(FlushTrigger::Interval).await;
                    }
                    _ = wake.notified() => {
                        let _ = dispatcher.flush(FlushTrigger::Threshold).await;
                    }
                }
            }
            debug!("flush scheduler stopped");
        });

        FlushScheduler { cancel, handle }
    }

    /// Stop future ticks and wait for the task, including any flush it is
    /// running, to finish.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.handle).await {
            warn!(error = %e, "flush scheduler task ended abnormally");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;
    use crate::error::DeliveryError;
    use crate::record::{Level, LogBatch, LogEntry};
    use crate::sink::LogSink;
    use crate::stats::Stats;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSink {
        sends: AtomicUsize,
    }

    #[async_trait]
    impl LogSink for CountingSink {
        async fn send_batch(&self, _batch: &LogBatch<'_>) -> Result<(), DeliveryError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn setup() -> (Arc<Buffer>, Arc<CountingSink>, Arc<Dispatcher>) {
        let buffer = Arc::new(Buffer::new(10, 100));
        let sink = Arc::new(CountingSink::default());
        let dispatcher = Arc::new(Dispatcher::new(
            buffer.clone(),
            sink.clone(),
            "proj".into(),
            Duration::from_millis(100),
            Duration::from_secs(1),
            Arc::new(Stats::default()),
        ));
        (buffer, sink, dispatcher)
    }

    fn push(buffer: &Buffer) {
        buffer
            .append(LogEntry::build(Level::Info, "tick", "svc", None, &[]).unwrap())
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_at_fixed_cadence() {
        let (buffer, sink, dispatcher) = setup();
        let mut scheduler = FlushScheduler::spawn(
            &Handle::current(),
            dispatcher,
            Duration::from_secs(5),
            Arc::new(Notify::new()),
        );

        push(&buffer);
        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(sink.sends.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(sink.sends.load(Ordering::SeqCst), 1);

        // empty ticks never reach the sink
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(sink.sends.load(Ordering::SeqCst), 1);

        push(&buffer);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sink.sends.load(Ordering::SeqCst), 2);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn wake_flushes_without_waiting_for_tick() {
        let (buffer, sink, dispatcher) = setup();
        let wake = Arc::new(Notify::new());
        let mut scheduler =
            FlushScheduler::spawn(&Handle::current(), dispatcher, Duration::from_secs(60), wake.clone());

        push(&buffer);
        wake.notify_one();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sink.sends.load(Ordering::SeqCst), 1);
        assert!(buffer.is_empty());

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_future_ticks() {
        let (buffer, sink, dispatcher) = setup();
        let mut scheduler = FlushScheduler::spawn(
            &Handle::current(),
            dispatcher,
            Duration::from_secs(1),
            Arc::new(Notify::new()),
        );
        scheduler.shutdown().await;
        assert!(scheduler.is_cancelled());

        push(&buffer);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(sink.sends.load(Ordering::SeqCst), 0);
        assert_eq!(buffer.len(), 1);
    }
}
