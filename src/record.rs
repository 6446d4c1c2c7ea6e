use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::LogError;

/// Structured context attached to a [`LogEntry`].
pub type Context = serde_json::Map<String, serde_json::Value>;

/// Severity accepted by the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// A single log record as shipped to the collector.
///
/// Entries are immutable: fields are only readable through accessors, and
/// the timestamp is taken when [`LogEntry::build`] runs, not when the entry
/// is flushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: DateTime<Utc>,
    level: Level,
    message: String,
    service: String,
    #[serde(default)]
    context: Context,
    #[serde(default)]
    tags: Vec<String>,
}

impl LogEntry {
    /// Build an entry stamped with the current wall-clock time.
    ///
    /// **Parameters**
    /// - `level`: severity of the entry.
    /// - `message`: human readable text, must not be empty.
    /// - `service`: service name bound to the logger.
    /// - `context`: optional structured fields; `None` means an empty map.
    /// - `tags`: free-form labels, kept in the given order.
    ///
    /// **Returns**
    /// - `Err(LogError::EmptyMessage)` if `message` is empty.
    pub fn build(
        level: Level,
        message: impl Into<String>,
        service: impl Into<String>,
        context: Option<Context>,
        tags: &[&str],
    ) -> Result<Self, LogError> {
        let timestamp = Utc::now();
        let message = message.into();
        if message.is_empty() {
            return Err(LogError::EmptyMessage);
        }

        Ok(LogEntry {
            timestamp,
            level,
            message,
            service: service.into(),
            context: context.unwrap_or_default(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Request body of `POST /api/logs/batch`.
#[derive(Debug, Serialize)]
pub struct LogBatch<'a> {
    pub project_slug: &'a str,
    pub logs: &'a [LogEntry],
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("info".parse::<Level>(), Ok(Level::Info));
        assert_eq!("Warning".parse::<Level>(), Ok(Level::Warn));
        assert_eq!(" ERROR ".parse::<Level>(), Ok(Level::Error));
        assert!("fatal".parse::<Level>().is_err());
    }

    #[test]
    fn build_defaults_context_and_tags() {
        let entry = LogEntry::build(Level::Debug, "hello", "api", None, &[]).unwrap();
        assert!(entry.context().is_empty());
        assert!(entry.tags().is_empty());
        assert_eq!(entry.service(), "api");
    }

    #[test]
    fn build_rejects_empty_message() {
        let err = LogEntry::build(Level::Info, "", "api", None, &[]).unwrap_err();
        assert_eq!(err, LogError::EmptyMessage);
    }

    #[test]
    fn timestamps_follow_call_order() {
        let first = LogEntry::build(Level::Info, "a", "api", None, &[]).unwrap();
        let second = LogEntry::build(Level::Info, "b", "api", None, &[]).unwrap();
        assert!(first.timestamp() <= second.timestamp());
    }

    #[test]
    fn batch_serializes_to_wire_shape() {
        let mut context = Context::new();
        context.insert("user_id".into(), json!(42));
        let entry = LogEntry::build(Level::Warn, "slow query", "db", Some(context), &["sql", "perf"]).unwrap();
        let logs = vec![entry];
        let batch = LogBatch { project_slug: "demo", logs: &logs };

        let value = serde_json::to_value(&batch).unwrap();
        assert_eq!(value["project_slug"], "demo");
        let log = &value["logs"][0];
        assert_eq!(log["level"], "WARN");
        assert_eq!(log["message"], "slow query");
        assert_eq!(log["service"], "db");
        assert_eq!(log["context"], json!({ "user_id": 42 }));
        assert_eq!(log["tags"], json!(["sql", "perf"]));
        let ts = log["timestamp"].as_str().unwrap();
        assert!(ts.ends_with('Z'), "timestamp {ts} should be UTC with Z suffix");
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
