use crate::error::DeliveryError;
use crate::record::LogBatch;
use crate::sink::LogSink;
use async_trait::async_trait;

/// A sink that accepts and discards every batch.
///
/// Useful for measuring the overhead of buffering without any network
/// I/O, and for tests that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl LogSink for NoopSink {
    async fn send_batch(&self, _batch: &LogBatch<'_>) -> Result<(), DeliveryError> {
        Ok(())
    }
}
