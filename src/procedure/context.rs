// src/procedure/context.rs

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::control::{SharedStatus, StopFlag};
use crate::errors::Cancelled;
use crate::types::{TaskStatus, Topic};
use crate::worker::EventRouter;

/// Hooks the worker injects into a procedure.
///
/// Carries the cancellation predicate, the emit function and a read-only
/// view of the run status. Cheap to clone; clones talk to the same run.
///
/// `emit` on the `results` topic blocks while the results channel is full,
/// so it must be called from blocking code (the procedure hooks are), never
/// from inside an async task.
#[derive(Debug, Clone)]
pub struct Context {
    stop: StopFlag,
    status: SharedStatus,
    router: EventRouter,
}

impl Context {
    pub(crate) fn new(stop: StopFlag, status: SharedStatus, router: EventRouter) -> Self {
        Self {
            stop,
            status,
            router,
        }
    }

    /// Non-blocking poll of the stop flag.
    pub fn should_stop(&self) -> bool {
        self.stop.should_stop()
    }

    /// `Err(Cancelled)` once a stop was requested, for use with `?`.
    pub fn check_stop(&self) -> Result<(), Cancelled> {
        if self.should_stop() {
            Err(Cancelled::new("stop requested"))
        } else {
            Ok(())
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status.get()
    }

    /// Emit an event. Payloads that fail to serialize are logged and dropped.
    ///
    /// `status` events are reserved for the worker's own transitions and are
    /// dropped here.
    pub fn emit<T: Serialize>(&self, topic: Topic, payload: T) {
        if topic == Topic::Status {
            warn!(status = %self.status(), "procedures cannot report status; event dropped");
            return;
        }
        match serde_json::to_value(payload) {
            Ok(value) => self.router.emit(topic, value),
            Err(e) => warn!(%topic, error = %e, "dropping event with unserializable payload"),
        }
    }

    /// Emit one result record.
    pub fn emit_result<T: Serialize>(&self, record: T) {
        self.emit(Topic::Results, record);
    }

    /// Emit progress in percent.
    pub fn emit_progress(&self, percent: f64) {
        self.router.emit(Topic::Progress, Value::from(percent));
    }
}
