// src/logging.rs

//! Logging for `labrun` using `tracing` + `tracing-subscriber`.
//!
//! A worker run never touches the global subscriber. Instead it builds its
//! own [`Dispatch`] around a [`ChannelLayer`] and installs it with
//! `tracing::dispatcher::with_default` for the lifetime of the run, so every
//! log line produced by the worker, the recorder and the procedure ends up
//! in that run's monitor and log channels.
//!
//! Priority for determining the level of a run:
//! 1. `WorkerOptions::log_level` (if provided)
//! 2. `LABRUN_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`

use std::fmt;

use anyhow::Result;
use serde_json::json;
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, fmt as tracing_fmt};

use crate::events::{Event, LogRecord, LogSender, MonitorGate};
use crate::types::{LogLevel, Topic};

/// Environment variable consulted when no explicit level is configured.
pub const LOG_ENV_VAR: &str = "LABRUN_LOG";

/// Initialise a global stderr subscriber for host applications.
///
/// The worker itself never calls this. Safe to call once at startup.
pub fn init_logging(level: Option<LogLevel>) -> Result<()> {
    tracing_fmt()
        .with_max_level(resolve_level(level))
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing global subscriber: {e}"))?;

    Ok(())
}

/// Resolve the effective level: explicit setting, then `LABRUN_LOG`, then info.
pub fn resolve_level(level: Option<LogLevel>) -> tracing::Level {
    match level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|s| s.parse::<LogLevel>().ok())
            .map(level_from_log_level)
            .unwrap_or(tracing::Level::INFO),
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

/// Build the dispatch a single run logs through.
pub fn scoped_dispatch(level: tracing::Level, layer: ChannelLayer) -> Dispatch {
    let subscriber =
        tracing_subscriber::registry().with(layer.with_filter(LevelFilter::from_level(level)));
    Dispatch::new(subscriber)
}

/// Layer that forwards every event into a run's channels.
///
/// Each event becomes a [`LogRecord`] on the log channel and a `log`-topic
/// event on the monitor channel, until that channel's gate is closed. Send
/// failures (observer gone) are ignored.
#[derive(Debug, Clone)]
pub struct ChannelLayer {
    monitor: MonitorGate,
    log: LogSender,
}

impl ChannelLayer {
    pub fn new(monitor: impl Into<MonitorGate>, log: LogSender) -> Self {
        Self {
            monitor: monitor.into(),
            log,
        }
    }
}

impl<S: Subscriber> Layer<S> for ChannelLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        let record = LogRecord {
            level: meta.level().to_string(),
            target: meta.target().to_string(),
            message: visitor.finish(),
        };

        let payload = json!({
            "level": record.level,
            "target": record.target,
            "message": record.message,
        });
        self.monitor.send(Event::new(Topic::Log, payload));
        let _ = self.log.send(record);
    }
}

/// Flattens an event into `message k=v k=v`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            return self.message;
        }
        let fields = self.fields.join(" ");
        if self.message.is_empty() {
            fields
        } else {
            format!("{} {}", self.message, fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}
