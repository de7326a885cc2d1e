// src/worker/mod.rs

//! Task supervisor.
//!
//! A [`Worker`] owns one procedure run end to end:
//! - construction resolves the procedure from the sink and validates it;
//! - [`Worker::start`] moves the run onto a blocking thread and hands back a
//!   [`WorkerHandle`] for stop/join/status;
//! - the run itself (recorder, routing, lifecycle, ordered shutdown) lives
//!   in [`runner`], driven by the pure decisions in [`core`].
//!
//! A worker is consumed by `start`, so it cannot be run twice.

pub mod core;
pub mod handle;
pub mod router;
pub mod runner;

use std::fmt;

use tokio::runtime::Handle;
use tracing::debug;

use crate::config::WorkerOptions;
use crate::control::{SharedStatus, StopFlag};
use crate::errors::{LabrunError, Result};
use crate::events::{
    LogReceiver, LogSender, MonitorReceiver, MonitorSender, ResultsReceiver, ResultsSender,
    log_channel, monitor_channel, results_channel,
};
use crate::procedure::{Procedure, ProcedureRegistry};
use crate::sink::SharedSink;
use crate::types::TaskStatus;

pub use self::core::{Outcome, ShutdownAction, plan_shutdown};
pub use handle::{JoinState, WorkerHandle};
pub use router::EventRouter;

use runner::Runner;

pub struct Worker {
    procedure: Box<dyn Procedure>,
    procedure_id: String,
    sink: SharedSink,
    options: WorkerOptions,
    stop: StopFlag,
    status: SharedStatus,
    results_tx: ResultsSender,
    results_rx: ResultsReceiver,
    monitor_tx: MonitorSender,
    monitor_rx: Option<MonitorReceiver>,
    log_tx: LogSender,
    log_rx: Option<LogReceiver>,
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("port", &self.options.port)
            .field("procedure", &self.procedure.name())
            .field("should_stop", &self.stop.should_stop())
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// Resolve the sink's procedure through `registry` and validate it.
    ///
    /// Fails with [`LabrunError::Construction`] when the sink does not name
    /// a buildable procedure, and with [`LabrunError::Validation`] when the
    /// procedure rejects its parameters. Nothing is started in either case.
    pub fn new(
        sink: SharedSink,
        registry: &ProcedureRegistry,
        mut options: WorkerOptions,
    ) -> Result<Self> {
        let (procedure_id, params) = {
            let guard = sink
                .lock()
                .map_err(|_| LabrunError::Construction("result sink lock poisoned".to_string()))?;
            (guard.procedure_id().to_string(), guard.parameters().clone())
        };

        if !registry.contains(&procedure_id) {
            return Err(LabrunError::Construction(format!(
                "result sink names unknown procedure '{procedure_id}'"
            )));
        }

        let procedure = registry.resolve(&procedure_id, &params).map_err(|e| {
            LabrunError::Construction(format!("building procedure '{procedure_id}': {e:#}"))
        })?;

        procedure
            .check_parameters()
            .map_err(|e| LabrunError::Validation(format!("{procedure_id}: {e:#}")))?;

        let (results_tx, results_rx) = results_channel(options.results_capacity);
        let (monitor_tx, monitor_rx) = monitor_channel();
        let (log_tx, log_rx) = match options.log_channel.take() {
            Some(tx) => (tx, None),
            None => {
                let (tx, rx) = log_channel();
                (tx, Some(rx))
            }
        };

        debug!(procedure = %procedure_id, "worker constructed");

        Ok(Self {
            procedure,
            procedure_id,
            sink,
            options,
            stop: StopFlag::new(),
            status: SharedStatus::new(),
            results_tx,
            results_rx,
            monitor_tx,
            monitor_rx: Some(monitor_rx),
            log_tx,
            log_rx,
        })
    }

    pub fn procedure_id(&self) -> &str {
        &self.procedure_id
    }

    /// Always `Queued` before `start`.
    pub fn status(&self) -> TaskStatus {
        self.status.get()
    }

    /// Take the monitor receiver. Returns `None` on the second call.
    pub fn take_monitor(&mut self) -> Option<MonitorReceiver> {
        self.monitor_rx.take()
    }

    /// Take the log receiver the worker allocated. `None` when a log channel
    /// was supplied through [`WorkerOptions::with_log_channel`] or when the
    /// receiver was already taken.
    pub fn take_log(&mut self) -> Option<LogReceiver> {
        self.log_rx.take()
    }

    /// Run the procedure on the ambient Tokio runtime's blocking pool.
    pub fn start(self) -> Result<WorkerHandle> {
        let runtime = Handle::try_current().map_err(|e| {
            LabrunError::Runtime(format!("Worker::start requires a Tokio runtime: {e}"))
        })?;

        let stop = self.stop.clone();
        let status = self.status.clone();
        let runner = Runner::new(self, runtime.clone());
        let join = runtime.spawn_blocking(move || runner.run());

        Ok(WorkerHandle::new(join, stop, status))
    }
}
