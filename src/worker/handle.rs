// src/worker/handle.rs

use std::future::Future;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tracing::{error, warn};

use crate::control::{SharedStatus, StopFlag};
use crate::types::TaskStatus;

/// Result of a join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    /// The worker's execution unit has terminated.
    Finished,
    /// Still running (timeout elapsed, or interrupted before it stopped).
    Running,
}

enum Wait {
    Joined(Result<(), JoinError>),
    TimedOut,
    Interrupted,
}

/// Caller-side handle to a started worker.
#[derive(Debug)]
pub struct WorkerHandle {
    join: Option<JoinHandle<()>>,
    stop: StopFlag,
    status: SharedStatus,
}

impl WorkerHandle {
    pub(crate) fn new(join: JoinHandle<()>, stop: StopFlag, status: SharedStatus) -> Self {
        Self {
            join: Some(join),
            stop,
            status,
        }
    }

    /// Request a cooperative stop. Idempotent.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// How many times a stop was requested, through this handle or the join
    /// path.
    pub fn stop_requests(&self) -> usize {
        self.stop.requests()
    }

    pub fn should_stop(&self) -> bool {
        self.stop.should_stop()
    }

    pub fn status(&self) -> TaskStatus {
        self.status.get()
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(|j| j.is_finished())
    }

    /// Wait up to `timeout` for the worker to terminate.
    ///
    /// A timeout never stops the worker. This installs no signal handler;
    /// use [`WorkerHandle::join_or_ctrl_c`] or
    /// [`WorkerHandle::join_or_interrupt`] for an interruptible wait.
    pub async fn join(&mut self, timeout: Duration) -> JoinState {
        self.join_or_interrupt(timeout, std::future::pending()).await
    }

    /// [`WorkerHandle::join`], interrupted by Ctrl-C.
    ///
    /// Listening for Ctrl-C through Tokio replaces the default SIGINT
    /// behaviour for the rest of the process, so only hosts that own signal
    /// handling should call this.
    pub async fn join_or_ctrl_c(&mut self, timeout: Duration) -> JoinState {
        self.join_or_interrupt(timeout, ctrl_c()).await
    }

    /// Like [`WorkerHandle::join`], interrupted by `interrupt`.
    ///
    /// When `interrupt` completes first it counts as a stop request: the
    /// worker is asked to stop exactly once and a non-blocking join is
    /// attempted.
    pub async fn join_or_interrupt<F>(&mut self, timeout: Duration, interrupt: F) -> JoinState
    where
        F: Future<Output = ()>,
    {
        let wait = {
            let Some(handle) = self.join.as_mut() else {
                return JoinState::Finished;
            };
            tokio::select! {
                res = tokio::time::timeout(timeout, handle) => match res {
                    Ok(joined) => Wait::Joined(joined),
                    Err(_) => Wait::TimedOut,
                },
                () = interrupt => Wait::Interrupted,
            }
        };

        match wait {
            Wait::Joined(joined) => {
                self.finish(joined);
                JoinState::Finished
            }
            Wait::TimedOut => JoinState::Running,
            Wait::Interrupted => {
                warn!("user stopped worker join prematurely");
                self.stop();
                self.join_now().await
            }
        }
    }

    /// Non-blocking join.
    async fn join_now(&mut self) -> JoinState {
        match self.join.as_mut() {
            None => JoinState::Finished,
            Some(handle) if handle.is_finished() => {
                let joined = handle.await;
                self.finish(joined);
                JoinState::Finished
            }
            Some(_) => JoinState::Running,
        }
    }

    fn finish(&mut self, joined: Result<(), JoinError>) {
        self.join = None;
        if let Err(e) = joined {
            error!(error = %e, "worker execution unit terminated abnormally");
        }
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C; join is not interruptible");
        std::future::pending::<()>().await;
    }
}
