//! Running async work to completion from synchronous teardown code.
//!
//! A logger's last handle may be dropped while its runtime is shutting
//! down, or after `block_on` has already returned. Spawning the final
//! flush is not enough there: the task never gets polled. The helpers
//! below drive the flush on the spot instead.

use std::future::Future;
use std::thread;

use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tracing::warn;

/// `true` if the caller runs inside a multi-thread runtime, where
/// [`block_on`] can wait for other tasks without stalling them.
pub(crate) fn in_multi_thread_runtime() -> bool {
    Handle::try_current().is_ok_and(|h| h.runtime_flavor() == RuntimeFlavor::MultiThread)
}

/// Drive `future` to completion, blocking the calling thread.
///
/// Inside a multi-thread runtime the worker is handed off with
/// `block_in_place` and the future runs on the same runtime. Anywhere
/// else (current-thread runtime, no runtime at all) it runs on a helper
/// thread with a private current-thread runtime, joined before returning.
///
/// Returns `None` if the helper thread could not be started or panicked.
pub(crate) fn block_on<F>(future: F) -> Option<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    if in_multi_thread_runtime() {
        let handle = Handle::current();
        return Some(tokio::task::block_in_place(move || handle.block_on(future)));
    }

    let spawned = thread::Builder::new()
        .name("devsmith-logger-teardown".into())
        .spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!(error = %e, "could not build teardown runtime");
                    return None;
                }
            };
            Some(runtime.block_on(future))
        });

    match spawned {
        Ok(worker) => worker.join().ok().flatten(),
        Err(e) => {
            warn!(error = %e, "could not start teardown thread");
            None
        }
    }
}
