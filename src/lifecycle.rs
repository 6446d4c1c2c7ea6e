use std::sync::atomic::{AtomicU8, Ordering};

/// One-way lifecycle of a logger: `Active → Closing → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    /// Accepting `log()` calls; the scheduler is running.
    Active = 0,
    /// `close()` is cancelling the scheduler and running the final flush.
    Closing = 1,
    /// Terminal.
    Closed = 2,
}

impl LifecycleState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => LifecycleState::Active,
            1 => LifecycleState::Closing,
            _ => LifecycleState::Closed,
        }
    }
}

#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        StateCell(AtomicU8::new(LifecycleState::Active as u8))
    }

    pub fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move from `Active` to `Closing`. Only the first caller wins.
    pub fn begin_close(&self) -> bool {
        self.0
            .compare_exchange(
                LifecycleState::Active as u8,
                LifecycleState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn finish_close(&self) {
        self.0.store(LifecycleState::Closed as u8, Ordering::Release);
    }
}
