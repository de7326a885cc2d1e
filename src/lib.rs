// src/lib.rs

//! Supervised execution of long-running measurement procedures.
//!
//! This wires together:
//! - a [`Worker`] that owns one procedure run and its lifecycle
//! - a [`recorder::Recorder`] persisting `results` events in order
//! - a monitor channel for status/progress/error/log events
//! - an optional [`publisher::Publisher`] broadcasting every event over TCP
//! - cooperative cancellation through a shared [`StopFlag`]
//!
//! ```no_run
//! # use std::sync::{Arc, Mutex};
//! # use std::time::Duration;
//! # use labrun::{Context, Procedure, ProcedureRegistry, SharedSink, Worker, WorkerOptions};
//! # struct Sweep;
//! # impl Procedure for Sweep {
//! #     fn execute(&mut self, _ctx: &Context) -> anyhow::Result<()> { Ok(()) }
//! # }
//! # async fn demo(sink: SharedSink) -> labrun::errors::Result<()> {
//! let mut registry = ProcedureRegistry::new();
//! registry.register("sweep", |_params| Ok(Box::new(Sweep) as Box<dyn Procedure>));
//!
//! let mut worker = Worker::new(sink, &registry, WorkerOptions::default())?;
//! let _monitor = worker.take_monitor().expect("fresh worker");
//! let mut handle = worker.start()?;
//! handle.join(Duration::from_secs(60)).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod control;
pub mod errors;
pub mod events;
pub mod logging;
pub mod procedure;
pub mod publisher;
pub mod recorder;
pub mod sink;
pub mod types;
pub mod worker;

pub use config::WorkerOptions;
pub use control::{SharedStatus, StopFlag};
pub use errors::{Cancelled, LabrunError};
pub use events::{Event, LogRecord, MonitorMessage, RecorderMessage};
pub use procedure::{Context, Procedure, ProcedureRegistry};
pub use sink::{Parameters, ResultSink, SharedSink};
pub use types::{LogLevel, TaskStatus, Topic};
pub use worker::{JoinState, Worker, WorkerHandle};
