use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::buffer::Buffer;
use crate::config::LoggerConfig;
use crate::dispatcher::{Dispatcher, FlushTrigger};
use crate::error::{ConfigError, DeliveryError, LogError};
use crate::lifecycle::{LifecycleState, StateCell};
use crate::record::{Context, Level, LogEntry};
use crate::registry;
use crate::scheduler::FlushScheduler;
use crate::sink::LogSink;
use crate::stats::{LoggerStats, Stats};
use crate::teardown;

/// Buffered, batching client for the DevSmith logs API.
///
/// `log()` and the level helpers only build an entry and push it into an
/// in-memory buffer; they never wait on the network. A background task
/// flushes the buffer every `flush_interval`, and early whenever it
/// reaches `batch_size` entries. Failed batches go back into the buffer
/// and are retried later.
///
/// The handle is cheap to clone; all clones share one buffer and one
/// scheduler. Call [`Logger::close`] (or
/// [`shutdown_all`](crate::registry::shutdown_all)) to deliver what is
/// left. A logger whose last handle is dropped unclosed runs that final
/// flush itself, blocking the dropping thread until it completes.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    id: u64,
    service_name: String,
    buffer: Arc<Buffer>,
    dispatcher: Arc<Dispatcher>,
    wake: Arc<Notify>,
    scheduler: Mutex<Option<FlushScheduler>>,
    state: StateCell,
    stats: Arc<Stats>,
    runtime: Handle,
}

impl Logger {
    /// Create a logger that ships to `config.api_url` over HTTP.
    ///
    /// Must be called from within a tokio runtime; the flush scheduler is
    /// spawned on it.
    ///
    /// **Returns**
    /// - `Err(ConfigError::MissingField)` if `api_key`, `project_slug` or
    ///   `service_name` is empty.
    /// - `Err(ConfigError::NoRuntime)` outside a runtime.
    #[cfg(feature = "http")]
    pub fn new(config: LoggerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sink = crate::http::HttpSink::new(
            config.effective_api_url(),
            config.api_key.clone(),
            config.request_timeout,
        )?;
        Self::with_sink(config, Arc::new(sink))
    }

    /// Create a logger that hands its batches to a custom [`LogSink`].
    pub fn with_sink(config: LoggerConfig, sink: Arc<dyn LogSink>) -> Result<Self, ConfigError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

        let stats = Arc::new(Stats::default());
        let buffer = Arc::new(Buffer::new(config.batch_size, config.max_buffered));
        let dispatcher = Arc::new(Dispatcher::new(
            buffer.clone(),
            sink,
            config.project_slug.clone(),
            config.initial_backoff,
            config.max_backoff,
            stats.clone(),
        ));
        let wake = Arc::new(Notify::new());
        let scheduler = FlushScheduler::spawn(&runtime, dispatcher.clone(), config.flush_interval, wake.clone());

        let inner = Arc::new(Inner {
            id: registry::next_id(),
            service_name: config.service_name,
            buffer,
            dispatcher,
            wake,
            scheduler: Mutex::new(Some(scheduler)),
            state: StateCell::new(),
            stats,
            runtime,
        });
        registry::register(inner.id, Arc::downgrade(&inner));

        debug!(
            service = %inner.service_name,
            project = %config.project_slug,
            batch_size = config.batch_size,
            flush_interval_ms = config.flush_interval.as_millis() as u64,
            "logger started"
        );
        Ok(Logger { inner })
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Logger { inner }
    }

    /// Record one entry.
    ///
    /// **Parameters**
    /// - `level`: severity.
    /// - `message`: non-empty text.
    /// - `context`: optional structured fields.
    /// - `tags`: free-form labels.
    ///
    /// **Returns**
    /// - `Err(LogError::Closed)` once `close()` has started.
    /// - `Err(LogError::EmptyMessage)` for an empty message.
    ///
    /// Never blocks on I/O and never reports delivery failures.
    pub fn log(
        &self,
        level: Level,
        message: impl Into<String>,
        context: Option<Context>,
        tags: &[&str],
    ) -> Result<(), LogError> {
        let inner = &*self.inner;
        let result = if inner.state.get() != LifecycleState::Active {
            Err(LogError::Closed)
        } else {
            LogEntry::build(level, message, inner.service_name.as_str(), context, tags)
                .and_then(|entry| inner.buffer.append(entry))
        };

        match result {
            Ok(batch_ready) => {
                Stats::incr(&inner.stats.accepted, 1);
                if batch_ready {
                    inner.wake.notify_one();
                }
                Ok(())
            }
            Err(e) => {
                Stats::incr(&inner.stats.rejected, 1);
                Err(e)
            }
        }
    }

    pub fn debug(&self, message: impl Into<String>, context: Option<Context>, tags: &[&str]) -> Result<(), LogError> {
        self.log(Level::Debug, message, context, tags)
    }

    pub fn info(&self, message: impl Into<String>, context: Option<Context>, tags: &[&str]) -> Result<(), LogError> {
        self.log(Level::Info, message, context, tags)
    }

    pub fn warn(&self, message: impl Into<String>, context: Option<Context>, tags: &[&str]) -> Result<(), LogError> {
        self.log(Level::Warn, message, context, tags)
    }

    pub fn error(&self, message: impl Into<String>, context: Option<Context>, tags: &[&str]) -> Result<(), LogError> {
        self.log(Level::Error, message, context, tags)
    }

    /// Send everything buffered now, ignoring any retry backoff.
    ///
    /// Waits for an in-flight flush to finish first.
    ///
    /// **Returns** the number of entries delivered, or the error of the
    /// batch that failed (its entries are back in the buffer).
    pub async fn flush(&self) -> Result<usize, DeliveryError> {
        self.inner.dispatcher.flush(FlushTrigger::Explicit).await
    }

    /// Stop the scheduler and deliver whatever is buffered.
    ///
    /// Only the first call does anything; later calls, including ones
    /// racing the first, return `Ok(())` immediately. From the moment this
    /// is called `log()` returns [`LogError::Closed`].
    pub async fn close(&self) -> Result<(), DeliveryError> {
        let inner = &*self.inner;
        if !inner.state.begin_close() {
            return Ok(());
        }
        inner.buffer.seal();

        let scheduler = inner.scheduler.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(mut scheduler) = scheduler {
            scheduler.shutdown().await;
        }

        let result = inner.dispatcher.flush(FlushTrigger::Close).await;
        inner.state.finish_close();
        registry::unregister(inner.id);

        match &result {
            Ok(delivered) => debug!(service = %inner.service_name, delivered, "logger closed"),
            Err(e) => warn!(
                service = %inner.service_name,
                error = %e,
                undelivered = inner.buffer.len(),
                "logger closed with undelivered entries"
            ),
        }
        result.map(|_| ())
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.state.get()
    }

    /// Entries currently waiting in the buffer.
    pub fn buffered(&self) -> usize {
        self.inner.buffer.len()
    }

    pub fn stats(&self) -> LoggerStats {
        self.inner.stats.snapshot(self.inner.buffer.dropped())
    }

    pub fn service_name(&self) -> &str {
        &self.inner.service_name
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        registry::unregister(self.id);
        if !self.state.begin_close() {
            return;
        }
        self.buffer.seal();
        // dropping the scheduler cancels it
        self.scheduler.get_mut().unwrap_or_else(PoisonError::into_inner).take();

        if !self.buffer.is_empty() {
            debug!(service = %self.service_name, pending = self.buffer.len(), "logger dropped unclosed, flushing");
            let dispatcher = self.dispatcher.clone();
            let final_flush = async move { dispatcher.flush(FlushTrigger::Close).await };

            // A cycle still running on a current-thread runtime cannot make
            // progress while this thread blocks, so leave the flush to it.
            if self.dispatcher.is_idle() || teardown::in_multi_thread_runtime() {
                match teardown::block_on(final_flush) {
                    Some(Ok(delivered)) => debug!(service = %self.service_name, delivered, "dropped logger flushed"),
                    Some(Err(e)) => warn!(service = %self.service_name, error = %e, "final flush of dropped logger failed"),
                    None => warn!(service = %self.service_name, "final flush of dropped logger did not run"),
                }
            } else {
                self.runtime.spawn(async move {
                    if let Err(e) = final_flush.await {
                        warn!(error = %e, "final flush of dropped logger failed");
                    }
                });
            }
        }
        self.state.finish_close();
    }
}
