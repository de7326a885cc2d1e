use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a procedure run.
///
/// The only legal path is `Queued -> Running -> {Finished | Aborted | Failed}`.
/// Terminal variants are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TaskStatus {
    Queued = 0,
    Running = 1,
    Failed = 2,
    Aborted = 3,
    Finished = 4,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Failed | TaskStatus::Aborted | TaskStatus::Finished
        )
    }

    /// Whether moving from `self` to `next` respects the lifecycle.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        match (self, next) {
            (TaskStatus::Queued, TaskStatus::Running) => true,
            (TaskStatus::Running, next) => next.is_terminal(),
            _ => false,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => TaskStatus::Running,
            2 => TaskStatus::Failed,
            3 => TaskStatus::Aborted,
            4 => TaskStatus::Finished,
            _ => TaskStatus::Queued,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Failed => "failed",
            TaskStatus::Aborted => "aborted",
            TaskStatus::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// Topic of an emitted event. Decides which channels the event reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Results,
    Status,
    Progress,
    Error,
    Log,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Results => "results",
            Topic::Status => "status",
            Topic::Progress => "progress",
            Topic::Error => "error",
            Topic::Log => "log",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "results" => Ok(Topic::Results),
            "status" => Ok(Topic::Status),
            "progress" => Ok(Topic::Progress),
            "error" => Ok(Topic::Error),
            "log" => Ok(Topic::Log),
            other => Err(format!(
                "invalid topic: {other} (expected one of results, status, progress, error, log)"
            )),
        }
    }
}

/// Log level as exposed in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}
