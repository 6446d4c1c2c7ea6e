use std::time::Duration;

use crate::env::{
    DEVSMITH_API_KEY_ENV, DEVSMITH_API_URL_ENV, DEVSMITH_BATCH_SIZE_ENV,
    DEVSMITH_FLUSH_INTERVAL_ENV, DEVSMITH_PROJECT_SLUG_ENV, DEVSMITH_SERVICE_NAME_ENV,
};
use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Upper bound accepted for every duration in [`LoggerConfig`].
pub const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration of a [`Logger`](crate::logger::Logger).
///
/// **Fields**
/// - `api_key`, `project_slug`, `service_name`: required, must be non-empty.
/// - `api_url`: base URL of the logs API; empty means [`DEFAULT_API_URL`].
/// - `batch_size`: buffered entry count that triggers a flush, and the
///   largest batch ever sent.
/// - `flush_interval`: cadence of the background flush.
/// - `request_timeout`: bound on a single send.
/// - `max_buffered`: cap on pending entries; the oldest are dropped past it.
/// - `initial_backoff` / `max_backoff`: delay before the scheduler retries
///   after a failed send, doubling per consecutive failure.
#[derive(Clone, Debug)]
pub struct LoggerConfig {
    pub api_key: String,
    pub api_url: String,
    pub project_slug: String,
    pub service_name: String,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub request_timeout: Duration,
    pub max_buffered: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl LoggerConfig {
    pub fn new(
        api_key: impl Into<String>,
        api_url: impl Into<String>,
        project_slug: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        LoggerConfig {
            api_key: api_key.into(),
            api_url: api_url.into(),
            project_slug: project_slug.into(),
            service_name: service_name.into(),
            batch_size: 100,
            flush_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            max_buffered: 10_000,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_buffered(mut self, max_buffered: usize) -> Self {
        self.max_buffered = max_buffered;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Build a config from `DEVSMITH_*` environment variables.
    ///
    /// The result is not validated; [`Logger::new`](crate::logger::Logger::new)
    /// does that.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::from_lookup(|key| std::env::var(key).ok())?;
        if cfg.api_url.trim().is_empty() {
            cfg.api_url = DEFAULT_API_URL.to_string();
        }
        Ok(cfg)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).unwrap_or_default();
        let mut cfg = LoggerConfig::new(
            get(DEVSMITH_API_KEY_ENV),
            get(DEVSMITH_API_URL_ENV),
            get(DEVSMITH_PROJECT_SLUG_ENV),
            get(DEVSMITH_SERVICE_NAME_ENV),
        );

        if let Some(raw) = lookup(DEVSMITH_BATCH_SIZE_ENV) {
            cfg.batch_size = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                field: "batch_size",
                reason: format!("{raw:?}: {e}"),
            })?;
        }
        if let Some(raw) = lookup(DEVSMITH_FLUSH_INTERVAL_ENV) {
            let secs: f64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                field: "flush_interval",
                reason: format!("{raw:?}: {e}"),
            })?;
            cfg.flush_interval = Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::InvalidValue {
                field: "flush_interval",
                reason: format!("{raw:?}: {e}"),
            })?;
        }
        Ok(cfg)
    }

    /// Check required fields and numeric bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingField("api_key"));
        }
        if self.project_slug.trim().is_empty() {
            return Err(ConfigError::MissingField("project_slug"));
        }
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::MissingField("service_name"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size", "must be at least 1"));
        }
        if self.flush_interval.is_zero() {
            return Err(invalid("flush_interval", "must be positive"));
        }
        if self.request_timeout.is_zero() {
            return Err(invalid("request_timeout", "must be positive"));
        }
        for (field, value) in [
            ("flush_interval", self.flush_interval),
            ("request_timeout", self.request_timeout),
            ("initial_backoff", self.initial_backoff),
            ("max_backoff", self.max_backoff),
        ] {
            if value > MAX_DURATION {
                return Err(invalid(field, "must not exceed 24h"));
            }
        }
        if self.max_buffered < self.batch_size {
            return Err(invalid("max_buffered", "must be at least batch_size"));
        }
        Ok(())
    }

    /// `api_url` with the default applied.
    pub fn effective_api_url(&self) -> &str {
        if self.api_url.trim().is_empty() {
            DEFAULT_API_URL
        } else {
            &self.api_url
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid() -> LoggerConfig {
        LoggerConfig::new("key", "http://collector", "proj", "api")
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = valid();
        assert_eq!(cfg.batch_size, 100);
        assert_eq!(cfg.flush_interval, Duration::from_secs(5));
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let mut cfg = valid();
        cfg.api_key.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingField("api_key"))));

        let mut cfg = valid();
        cfg.project_slug = "  ".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingField("project_slug"))));

        let mut cfg = valid();
        cfg.service_name.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingField("service_name"))));
    }

    #[test]
    fn degenerate_numbers_are_rejected() {
        assert!(valid().with_batch_size(0).validate().is_err());
        assert!(valid().with_flush_interval(Duration::ZERO).validate().is_err());
        assert!(valid().with_batch_size(50).with_max_buffered(10).validate().is_err());
    }

    #[test]
    fn oversized_durations_are_rejected() {
        let huge = Duration::from_secs(u64::MAX / 2);
        assert!(matches!(
            valid().with_flush_interval(huge).validate(),
            Err(ConfigError::InvalidValue { field: "flush_interval", .. })
        ));
        assert!(matches!(
            valid().with_backoff(huge, Duration::MAX).validate(),
            Err(ConfigError::InvalidValue { field: "initial_backoff", .. })
        ));
        assert!(matches!(
            valid().with_backoff(Duration::from_secs(1), Duration::MAX).validate(),
            Err(ConfigError::InvalidValue { field: "max_backoff", .. })
        ));
        assert!(valid().with_flush_interval(MAX_DURATION).validate().is_ok());
    }

    #[test]
    fn empty_url_falls_back_to_default() {
        let cfg = LoggerConfig::new("key", "", "proj", "api");
        assert_eq!(cfg.effective_api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn lookup_reads_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (DEVSMITH_API_KEY_ENV, "k"),
            (DEVSMITH_PROJECT_SLUG_ENV, "p"),
            (DEVSMITH_SERVICE_NAME_ENV, "s"),
            (DEVSMITH_BATCH_SIZE_ENV, "25"),
            (DEVSMITH_FLUSH_INTERVAL_ENV, "0.5"),
        ]);
        let cfg = LoggerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.api_key, "k");
        assert_eq!(cfg.batch_size, 25);
        assert_eq!(cfg.flush_interval, Duration::from_millis(500));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn lookup_rejects_garbage_numbers() {
        let cfg = LoggerConfig::from_lookup(|k| (k == DEVSMITH_BATCH_SIZE_ENV).then(|| "many".to_string()));
        assert!(matches!(cfg, Err(ConfigError::InvalidValue { field: "batch_size", .. })));
    }
}
