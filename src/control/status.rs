// src/control/status.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use thiserror::Error;

use crate::types::TaskStatus;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("illegal status transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// Atomic status cell. The worker is the only writer; handles read it.
#[derive(Debug, Clone)]
pub struct SharedStatus {
    inner: Arc<AtomicU8>,
}

impl SharedStatus {
    /// A fresh cell starts out `Queued`.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(TaskStatus::Queued as u8)),
        }
    }

    pub fn get(&self) -> TaskStatus {
        TaskStatus::from_u8(self.inner.load(Ordering::SeqCst))
    }

    /// Move to `next` if the lifecycle allows it.
    ///
    /// Returns the previous status on success.
    pub fn transition(&self, next: TaskStatus) -> Result<TaskStatus, InvalidTransition> {
        let mut current = self.inner.load(Ordering::SeqCst);
        loop {
            let from = TaskStatus::from_u8(current);
            if !from.can_transition_to(next) {
                return Err(InvalidTransition { from, to: next });
            }
            match self.inner.compare_exchange(
                current,
                next as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Ok(from),
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for SharedStatus {
    fn default() -> Self {
        Self::new()
    }
}
