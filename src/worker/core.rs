// src/worker/core.rs

//! Pure lifecycle decisions.
//!
//! Everything here is synchronous and free of channels, threads and IO, so
//! the lifecycle rules can be tested in isolation. The IO shell in
//! [`super::runner`] asks this module what to do and then does it.

use std::any::Any;

use anyhow::anyhow;

use crate::errors::Cancelled;
use crate::types::TaskStatus;

/// How the startup/execute phase of a run ended.
#[derive(Debug)]
pub enum Outcome {
    Completed,
    Aborted(String),
    Failed(anyhow::Error),
}

impl Outcome {
    /// Classify the result of `startup` + `execute`.
    ///
    /// A [`Cancelled`] anywhere in the error chain means the procedure
    /// observed the stop flag and unwound; any other error is a failure.
    pub fn from_result(result: anyhow::Result<()>) -> Self {
        match result {
            Ok(()) => Outcome::Completed,
            Err(err) => match err.chain().find_map(|e| e.downcast_ref::<Cancelled>()) {
                Some(cancelled) => Outcome::Aborted(cancelled.reason.clone()),
                None => Outcome::Failed(err),
            },
        }
    }

    /// Outcome for a procedure that panicked instead of returning.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Outcome::Failed(anyhow!("procedure panicked: {}", panic_message(&*payload)))
    }
}

/// Status change to apply during shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownAction {
    /// Stop was requested while still running.
    MarkAborted,
    /// Normal fall-through: mark finished and report 100% progress.
    MarkFinished,
    /// Already terminal (aborted or failed during execution).
    Keep,
}

pub fn plan_shutdown(status: TaskStatus, stop_requested: bool) -> ShutdownAction {
    match status {
        TaskStatus::Running if stop_requested => ShutdownAction::MarkAborted,
        TaskStatus::Running => ShutdownAction::MarkFinished,
        _ => ShutdownAction::Keep,
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
