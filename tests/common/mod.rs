#![allow(dead_code)]

use async_trait::async_trait;
use devsmith_logger::record::LogBatch;
use devsmith_logger::sink::LogSink;
use devsmith_logger::{DeliveryError, LogEntry, LoggerConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory sink that records every batch and can be switched into a
/// failing mode.
#[derive(Default)]
pub struct RecordingSink {
    failing: AtomicBool,
    batches: Mutex<Vec<Vec<LogEntry>>>,
}

impl RecordingSink {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn batches(&self) -> Vec<Vec<LogEntry>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.batches()
            .into_iter()
            .flatten()
            .map(|e| e.message().to_string())
            .collect()
    }
}

#[async_trait]
impl LogSink for RecordingSink {
    async fn send_batch(&self, batch: &LogBatch<'_>) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::sink("simulated outage"));
        }
        self.batches.lock().unwrap().push(batch.logs.to_vec());
        Ok(())
    }
}

pub fn config(api_url: &str) -> LoggerConfig {
    LoggerConfig::new("secret", api_url, "proj", "svc")
        .with_flush_interval(Duration::from_secs(60))
        .with_request_timeout(Duration::from_secs(2))
}
