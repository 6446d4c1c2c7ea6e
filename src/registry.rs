//! Process-wide list of live loggers, drained at shutdown.
//!
//! Every [`Logger`] registers a weak reference when it is created and
//! removes it when closed or dropped. An application calls
//! [`shutdown_all`] once before its runtime goes away so that loggers
//! nobody closed explicitly still deliver what they buffered.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use tracing::{debug, warn};

use crate::logger::{Inner, Logger};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);
static REGISTRY: OnceLock<Mutex<HashMap<u64, Weak<Inner>>>> = OnceLock::new();

fn registry() -> MutexGuard<'static, HashMap<u64, Weak<Inner>>> {
    REGISTRY
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) fn register(id: u64, inner: Weak<Inner>) {
    registry().insert(id, inner);
}

pub(crate) fn unregister(id: u64) {
    registry().remove(&id);
}

/// Number of registered loggers that have not been closed or dropped.
pub fn live_loggers() -> usize {
    registry().values().filter(|w| w.strong_count() > 0).count()
}

/// Close every registered logger, running each one's final flush.
///
/// Loggers are taken out of the registry before closing, so concurrent or
/// repeated calls never close the same logger twice; a second call finds
/// nothing left to do.
///
/// **Returns** the number of loggers closed by this call.
pub async fn shutdown_all() -> usize {
    let loggers: Vec<Logger> = registry()
        .drain()
        .filter_map(|(_, weak)| weak.upgrade())
        .map(Logger::from_inner)
        .collect();

    debug!(count = loggers.len(), "closing registered loggers");
    let mut closed = 0;
    for logger in loggers {
        if let Err(e) = logger.close().await {
            warn!(error = %e, "final flush failed during shutdown");
        }
        closed += 1;
    }
    closed
}
