use std::error::Error;

/// Error returned when a [`LoggerConfig`](crate::config::LoggerConfig) cannot
/// produce a logger. No logger object exists after this error.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("logger must be created inside a tokio runtime")]
    NoRuntime,

    #[cfg(feature = "http")]
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Error returned to callers of [`Logger::log`](crate::logger::Logger::log).
///
/// Delivery problems never show up here; they are handled by the
/// dispatcher and reported through `tracing`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogError {
    #[error("logger is closed")]
    Closed,

    #[error("log message must not be empty")]
    EmptyMessage,
}

/// Failure to hand a batch to the collector. The batch is requeued.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[cfg(feature = "http")]
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("collector rejected batch with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to serialize batch: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink error: {0}")]
    Sink(Box<dyn Error + Send + Sync>),
}

impl DeliveryError {
    /// Wrap an arbitrary transport error from a custom [`LogSink`](crate::sink::LogSink).
    pub fn sink(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        DeliveryError::Sink(err.into())
    }
}
