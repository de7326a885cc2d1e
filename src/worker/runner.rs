// src/worker/runner.rs

//! IO shell of a worker run.
//!
//! Runs on a blocking thread. Installs the run-scoped logging dispatch,
//! starts the recorder, binds the optional publisher, drives the procedure
//! hooks and always finishes with the ordered shutdown.

use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{Dispatch, debug, error, info, warn};

use crate::config::WorkerOptions;
use crate::control::{SharedStatus, StopFlag};
use crate::events::{LogSender, MonitorGate, MonitorSender, ResultsReceiver, ResultsSender};
use crate::logging::{self, ChannelLayer};
use crate::procedure::{Context, Procedure};
use crate::publisher::Publisher;
use crate::recorder::Recorder;
use crate::sink::SharedSink;
use crate::types::{TaskStatus, Topic};

use super::Worker;
use super::core::{Outcome, ShutdownAction, panic_message, plan_shutdown};
use super::router::EventRouter;

/// Everything a run needs, moved off the [`Worker`] at `start`.
pub(crate) struct Runner {
    procedure: Box<dyn Procedure>,
    name: String,
    sink: SharedSink,
    options: WorkerOptions,
    stop: StopFlag,
    status: SharedStatus,
    results_tx: ResultsSender,
    results_rx: ResultsReceiver,
    monitor_tx: MonitorSender,
    log_tx: LogSender,
    runtime: Handle,
}

impl Runner {
    pub(crate) fn new(worker: Worker, runtime: Handle) -> Self {
        let name = worker.procedure.name().to_string();
        Self {
            procedure: worker.procedure,
            name,
            sink: worker.sink,
            options: worker.options,
            stop: worker.stop,
            status: worker.status,
            results_tx: worker.results_tx,
            results_rx: worker.results_rx,
            monitor_tx: worker.monitor_tx,
            log_tx: worker.log_tx,
            runtime,
        }
    }

    /// Entry point of the execution unit.
    pub(crate) fn run(self) {
        let monitor = MonitorGate::new(self.monitor_tx.clone());
        let layer = ChannelLayer::new(monitor.clone(), self.log_tx.clone());
        let level = logging::resolve_level(self.options.log_level);
        let dispatch = logging::scoped_dispatch(level, layer);

        tracing::dispatcher::with_default(&dispatch, || self.run_scoped(&dispatch, &monitor));

        // Last message on the monitor channel; later log lines are dropped.
        monitor.close();
    }

    fn run_scoped(self, dispatch: &Dispatch, monitor: &MonitorGate) {
        info!("worker started");

        let Runner {
            procedure,
            name,
            sink,
            options,
            stop,
            status,
            results_tx,
            results_rx,
            monitor_tx: _,
            log_tx: _,
            runtime,
        } = self;

        let recorder = Recorder::new(results_rx, sink).spawn(&runtime, dispatch.clone());
        let publisher = bind_publisher(&options, &runtime);

        let router = EventRouter::new(results_tx, monitor.clone(), publisher);
        let ctx = Context::new(stop.clone(), status.clone(), router.clone());

        let mut execution = Execution {
            procedure,
            name,
            ctx,
            router,
            stop,
            status: status.clone(),
        };

        info!(procedure = %execution.name, "worker started running procedure");
        execution.update_status(TaskStatus::Running);
        execution.router.emit(Topic::Progress, Value::from(0.0));

        match execution.execute() {
            Outcome::Completed => {}
            Outcome::Aborted(reason) => execution.handle_abort(&reason),
            Outcome::Failed(err) => execution.handle_error(err),
        }

        execution.shutdown();
        drop(execution);

        match recorder.join(&runtime) {
            Ok(persisted) => debug!(persisted, "recorder joined"),
            Err(e) => error!(error = ?e, "recorder terminated with an error"),
        }

        info!(status = %status.get(), "worker finished");
    }
}

fn bind_publisher(options: &WorkerOptions, runtime: &Handle) -> Option<Arc<Publisher>> {
    let port = options.port?;
    let addr = SocketAddr::new(options.host, port);

    match Publisher::bind(addr, options.publisher_buffer, runtime) {
        Ok(publisher) => {
            info!(%addr, "worker publishing telemetry");
            Some(Arc::new(publisher))
        }
        Err(e) => {
            error!(
                %addr,
                error = %e,
                "couldn't bind telemetry publisher; continuing without network telemetry"
            );
            None
        }
    }
}

/// The procedure plus the hooks wired into it, for one run.
struct Execution {
    procedure: Box<dyn Procedure>,
    name: String,
    ctx: Context,
    router: EventRouter,
    stop: StopFlag,
    status: SharedStatus,
}

impl Execution {
    /// `startup` then `execute`, with panics turned into failures.
    fn execute(&mut self) -> Outcome {
        let procedure = &mut self.procedure;
        let ctx = &self.ctx;

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            procedure.startup(ctx)?;
            procedure.execute(ctx)
        }));

        match result {
            Ok(result) => Outcome::from_result(result),
            Err(payload) => Outcome::from_panic(payload),
        }
    }

    fn handle_abort(&self, reason: &str) {
        warn!(procedure = %self.name, %reason, "user stopped worker execution prematurely");
        self.update_status(TaskStatus::Aborted);
    }

    fn handle_error(&self, err: anyhow::Error) {
        error!(procedure = %self.name, error = ?err, "worker caught an error");
        self.router
            .emit(Topic::Error, Value::String(format!("{err:?}")));
        self.update_status(TaskStatus::Failed);
    }

    /// Apply a lifecycle transition and publish it as a `status` event.
    fn update_status(&self, next: TaskStatus) {
        match self.status.transition(next) {
            Ok(previous) => {
                debug!(from = %previous, to = %next, "status changed");
                self.router
                    .emit(Topic::Status, Value::String(next.to_string()));
            }
            Err(e) => warn!(error = %e, "ignoring status update"),
        }
    }

    fn shutdown(&mut self) {
        let procedure = &mut self.procedure;
        let ctx = &self.ctx;

        match panic::catch_unwind(AssertUnwindSafe(|| procedure.shutdown(ctx))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = ?e, "procedure shutdown hook failed"),
            Err(payload) => error!(
                panic = %panic_message(&*payload),
                "procedure shutdown hook panicked"
            ),
        }

        match plan_shutdown(self.status.get(), self.stop.should_stop()) {
            ShutdownAction::MarkAborted => {
                info!("stop requested during execution; marking run aborted");
                self.update_status(TaskStatus::Aborted);
            }
            ShutdownAction::MarkFinished => {
                self.update_status(TaskStatus::Finished);
                self.router.emit(Topic::Progress, Value::from(100.0));
            }
            ShutdownAction::Keep => {}
        }

        self.router.finish_results();
    }
}
