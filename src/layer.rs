use crate::logger::Logger;
use crate::record::{Context, Level};
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Events from this crate are diagnostics about delivery and must never
/// re-enter the pipeline they describe.
const OWN_TARGET: &str = "devsmith_logger";

/// `tracing_subscriber` layer that turns `tracing` events into
/// [`Logger::log`] calls.
///
/// Event fields become the entry's context, the event target is stored
/// under `context.target`, and the `message` field becomes the entry
/// message. Events below `min_level` and events emitted by this crate are
/// ignored.
pub struct LoggerLayer {
    logger: Logger,
    min_level: Level,
}

impl LoggerLayer {
    pub fn new(logger: Logger) -> Self {
        LoggerLayer {
            logger,
            min_level: Level::Debug,
        }
    }

    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }
}

fn map_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::INFO => Level::Info,
        _ => Level::Debug,
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let meta = event.metadata();
        if meta.target().starts_with(OWN_TARGET) {
            return;
        }
        let level = map_level(meta.level());
        if level < self.min_level {
            return;
        }

        let mut context = Context::new();
        let mut visitor = FieldVisitor::new(&mut context);
        event.record(&mut visitor);
        let message = visitor.message.take().unwrap_or_else(|| meta.name().to_string());
        context.insert("target".to_string(), Value::from(meta.target()));

        // Rejections (closed logger) are already counted in the logger's stats.
        let _ = self.logger.log(level, message, Some(context), &[]);
    }
}

/// Splits an event into its `message` and the remaining fields.
struct FieldVisitor<'a> {
    context: &'a mut Context,
    message: Option<String>,
}

impl<'a> FieldVisitor<'a> {
    fn new(context: &'a mut Context) -> Self {
        FieldVisitor { context, message: None }
    }

    fn put(&mut self, field: &Field, value: Value) {
        self.context.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            _ => self.put(field, Value::from(value)),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{value:?}")),
            _ => self.put(field, Value::String(format!("{value:?}"))),
        }
    }
}
