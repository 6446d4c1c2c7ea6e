use crate::error::DeliveryError;
use crate::record::LogBatch;
use async_trait::async_trait;

/// Asynchronous transport for [`LogBatch`]es produced by the dispatcher.
///
/// Implementations move one batch to a concrete collector (the DevSmith
/// HTTP API, a test double, etc). The dispatcher calls `send_batch` from
/// the scheduler task or from an explicit `flush()`; it is never awaited
/// by code calling `log()`.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Deliver one batch.
    ///
    /// **Parameters**
    /// - `batch`: non-empty batch of entries plus the project slug.
    ///
    /// **Returns**
    /// - `Ok(())` if the collector accepted the whole batch.
    /// - `Err(..)` on transport failure or a rejected response. The
    ///   dispatcher requeues every entry of the batch and retries later.
    ///
    /// Implementations should bound their own latency (request timeout):
    /// no other flush can start while this one is pending.
    async fn send_batch(&self, batch: &LogBatch<'_>) -> Result<(), DeliveryError>;
}
