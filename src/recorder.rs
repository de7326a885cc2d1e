// src/recorder.rs

//! Result consumer.
//!
//! The recorder drains the results channel on its own blocking thread and
//! persists every record to the sink before taking the next one, so records
//! land in exactly the order they were emitted. It stops at the sentinel.

use anyhow::{Context as _, anyhow};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{Dispatch, debug, error, info, warn};

use crate::events::{RecorderMessage, ResultsReceiver};
use crate::sink::SharedSink;

pub struct Recorder {
    rx: ResultsReceiver,
    sink: SharedSink,
}

impl Recorder {
    pub fn new(rx: ResultsReceiver, sink: SharedSink) -> Self {
        Self { rx, sink }
    }

    /// Run [`Recorder::drain`] on the runtime's blocking pool, logging
    /// through `dispatch`.
    pub fn spawn(self, runtime: &Handle, dispatch: Dispatch) -> RecorderHandle {
        let handle = runtime.spawn_blocking(move || {
            tracing::dispatcher::with_default(&dispatch, || self.drain())
        });
        RecorderHandle { handle }
    }

    /// Blocking drain loop. Returns the number of persisted records.
    ///
    /// A persistence failure ends the loop; dropping the receiver then makes
    /// any further result emits fail instead of blocking.
    pub fn drain(mut self) -> anyhow::Result<usize> {
        info!("recorder started");
        let mut persisted = 0usize;

        loop {
            match self.rx.blocking_recv() {
                Some(RecorderMessage::Record(record)) => {
                    let result = {
                        let mut sink = self
                            .sink
                            .lock()
                            .map_err(|_| anyhow!("result sink lock poisoned"))?;
                        sink.persist(&record)
                    };
                    if let Err(e) = result {
                        error!(record = persisted, error = ?e, "recorder failed to persist record");
                        return Err(e).with_context(|| format!("persisting record #{persisted}"));
                    }
                    persisted += 1;
                }
                Some(RecorderMessage::Sentinel) => {
                    debug!("recorder received sentinel");
                    self.rx.close();
                    break;
                }
                None => {
                    warn!("results channel closed before sentinel");
                    break;
                }
            }
        }

        info!(persisted, "recorder finished");
        Ok(persisted)
    }
}

/// Handle to a spawned recorder.
pub struct RecorderHandle {
    handle: JoinHandle<anyhow::Result<usize>>,
}

impl RecorderHandle {
    /// Block until the recorder finished. Must not be called from async code.
    pub fn join(self, runtime: &Handle) -> anyhow::Result<usize> {
        runtime
            .block_on(self.handle)
            .map_err(|e| anyhow!("recorder thread failed: {e}"))?
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
