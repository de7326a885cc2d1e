// src/control/stop.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared cancellation flag polled by procedures.
///
/// Setting the flag never interrupts anything on its own: a procedure has to
/// observe it through `should_stop()` and return. Repeated requests have the
/// same effect as one; they are only counted.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    requests: Arc<AtomicUsize>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent and safe to call from any thread.
    pub fn stop(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    pub fn should_stop(&self) -> bool {
        self.requests.load(Ordering::SeqCst) > 0
    }

    /// Number of `stop()` calls since creation or the last `clear()`.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.requests.store(0, Ordering::SeqCst);
    }
}
