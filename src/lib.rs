pub mod record;
pub mod buffer;
pub mod sink;
pub mod dispatcher;
pub mod scheduler;
pub mod lifecycle;
pub mod logger;
pub mod registry;
pub mod stats;
mod teardown;
pub mod config;
pub mod env;
pub mod error;
pub mod layer;

#[cfg(feature = "http")]
pub mod http;

pub mod init;
pub mod noop_sink;

pub use config::LoggerConfig;
pub use error::{ConfigError, DeliveryError, LogError};
pub use logger::Logger;
pub use record::{Context, Level, LogEntry};
pub use registry::shutdown_all;
