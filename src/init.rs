use crate::layer::LoggerLayer;
use crate::logger::Logger;
use crate::record::Level;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the global `tracing` bridge.
///
/// **Fields**
/// - `min_level`: lowest level forwarded to the [`Logger`].
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt` layer is
///   installed next to [`LoggerLayer`] so events (including this crate's
///   own delivery diagnostics) are also printed locally.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub min_level: Level,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            min_level: Level::Info,
            enable_stdout: true,
        }
    }
}

/// Install a global `tracing` subscriber that forwards events to `logger`.
///
/// **Returns**
/// - `Err(..)` if a global subscriber was already set.
pub fn init_tracing_with_config(logger: &Logger, config: LayerConfig) -> Result<(), SetGlobalDefaultError> {
    let layer = LoggerLayer::new(logger.clone()).with_min_level(config.min_level);

    // The two subscriber shapes have different types, hence two branches.
    if config.enable_stdout {
        let subscriber = Registry::default().with(layer).with(tracing_subscriber::fmt::layer());
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// [`init_tracing_with_config`] with [`LayerConfig::default`].
pub fn init_tracing(logger: &Logger) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(logger, LayerConfig::default())
}
