// src/config/options.rs

use std::net::IpAddr;

use crate::config::model::{ConfigFile, default_buffer, default_host, default_results_capacity};
use crate::events::LogSender;
use crate::types::LogLevel;

/// Runtime options for one [`crate::Worker`].
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Telemetry port; `None` disables the publisher.
    pub port: Option<u16>,
    pub host: IpAddr,
    pub publisher_buffer: usize,
    pub log_level: Option<LogLevel>,
    pub results_capacity: usize,
    /// Caller-supplied log channel; when `None` the worker allocates one.
    pub log_channel: Option<LogSender>,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            port: None,
            host: default_host(),
            publisher_buffer: default_buffer(),
            log_level: None,
            results_capacity: default_results_capacity(),
            log_channel: None,
        }
    }
}

impl WorkerOptions {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn with_results_capacity(mut self, capacity: usize) -> Self {
        self.results_capacity = capacity;
        self
    }

    pub fn with_log_channel(mut self, tx: LogSender) -> Self {
        self.log_channel = Some(tx);
        self
    }
}

impl From<&ConfigFile> for WorkerOptions {
    fn from(cfg: &ConfigFile) -> Self {
        Self {
            port: cfg.publisher.port,
            host: cfg.publisher.host,
            publisher_buffer: cfg.publisher.buffer,
            log_level: cfg.worker.log_level,
            results_capacity: cfg.worker.results_capacity,
            log_channel: None,
        }
    }
}
