//! Environment variable names read by
//! [`LoggerConfig::from_env`](crate::config::LoggerConfig::from_env).
//!
//! These are purely helpers; the logger itself never touches the
//! environment.

/// API key sent as a bearer token.
pub const DEVSMITH_API_KEY_ENV: &str = "DEVSMITH_API_KEY";

/// Base URL of the logs API, e.g. `http://localhost:3000`.
pub const DEVSMITH_API_URL_ENV: &str = "DEVSMITH_API_URL";

/// Project the logs belong to.
pub const DEVSMITH_PROJECT_SLUG_ENV: &str = "DEVSMITH_PROJECT_SLUG";

/// Logical service name stamped on every entry.
pub const DEVSMITH_SERVICE_NAME_ENV: &str = "DEVSMITH_SERVICE_NAME";

/// Optional batch size override.
pub const DEVSMITH_BATCH_SIZE_ENV: &str = "DEVSMITH_BATCH_SIZE";

/// Optional flush interval override, in (fractional) seconds.
pub const DEVSMITH_FLUSH_INTERVAL_ENV: &str = "DEVSMITH_FLUSH_INTERVAL_SECS";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
