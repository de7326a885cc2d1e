// src/events/mod.rs

//! Event types and the channels that carry them.
//!
//! Every consumer gets its own channel, with exactly one producer (the
//! worker) and one consumer:
//! - results channel (bounded): feeds the [`crate::recorder::Recorder`];
//!   a slow sink back-pressures the procedure;
//! - monitor channel (unbounded): status/progress/error events plus log
//!   lines, closed by [`MonitorMessage::Closed`] and written through a
//!   [`MonitorGate`] so nothing follows that marker;
//! - log channel (unbounded): structured [`LogRecord`]s.
//!
//! Ordering is FIFO per channel only.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::types::Topic;

/// A `(topic, payload)` pair emitted during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub topic: Topic,
    pub payload: Value,
}

impl Event {
    pub fn new(topic: Topic, payload: Value) -> Self {
        Self { topic, payload }
    }
}

/// Messages on the results channel.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderMessage {
    Record(Value),
    /// No further records follow.
    Sentinel,
}

/// Messages on the monitor channel.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorMessage {
    Event(Event),
    /// Closing marker: the worker has shut down.
    Closed,
}

/// A log line produced inside a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: String,
    pub target: String,
    pub message: String,
}

pub type ResultsSender = mpsc::Sender<RecorderMessage>;
pub type ResultsReceiver = mpsc::Receiver<RecorderMessage>;
pub type MonitorSender = mpsc::UnboundedSender<MonitorMessage>;
pub type MonitorReceiver = mpsc::UnboundedReceiver<MonitorMessage>;
pub type LogSender = mpsc::UnboundedSender<LogRecord>;
pub type LogReceiver = mpsc::UnboundedReceiver<LogRecord>;

/// Bounded results channel; `capacity` is clamped to at least 1.
pub fn results_channel(capacity: usize) -> (ResultsSender, ResultsReceiver) {
    mpsc::channel(capacity.max(1))
}

/// Shared write side of a monitor channel.
///
/// Every producer of a run (the router and the logging layer) sends through
/// the same gate. [`MonitorGate::close`] takes the sender out under the lock
/// and sends [`MonitorMessage::Closed`] on it, so the closing marker is
/// always the last message an observer receives.
#[derive(Debug, Clone)]
pub struct MonitorGate {
    inner: Arc<Mutex<Option<MonitorSender>>>,
}

impl MonitorGate {
    pub fn new(tx: MonitorSender) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(tx))),
        }
    }

    /// Forward `event`. Dropped silently once closed or when the observer
    /// is gone.
    pub fn send(&self, event: Event) {
        if let Ok(guard) = self.inner.lock() {
            if let Some(tx) = guard.as_ref() {
                let _ = tx.send(MonitorMessage::Event(event));
            }
        }
    }

    /// Send the closing marker. Idempotent.
    pub fn close(&self) {
        let tx = match self.inner.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(tx) = tx {
            let _ = tx.send(MonitorMessage::Closed);
        }
    }
}

impl From<MonitorSender> for MonitorGate {
    fn from(tx: MonitorSender) -> Self {
        Self::new(tx)
    }
}

pub fn monitor_channel() -> (MonitorSender, MonitorReceiver) {
    mpsc::unbounded_channel()
}

pub fn log_channel() -> (LogSender, LogReceiver) {
    mpsc::unbounded_channel()
}
