// src/config/model.rs

use std::net::{IpAddr, Ipv4Addr};

use serde::Deserialize;

use crate::types::LogLevel;

/// Raw configuration exactly as read from TOML.
///
/// ```toml
/// [worker]
/// log_level = "info"
/// results_capacity = 1024
///
/// [publisher]
/// port = 5888
/// host = "0.0.0.0"
/// buffer = 256
/// ```
///
/// All sections are optional and have reasonable defaults. Convert into a
/// [`ConfigFile`] with `ConfigFile::try_from` to validate it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub worker: WorkerSection,

    #[serde(default)]
    pub publisher: PublisherSection,
}

/// `[worker]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSection {
    /// Level of the run-scoped logger. When absent, `LABRUN_LOG` or `info`.
    #[serde(default)]
    pub log_level: Option<LogLevel>,

    /// Capacity of the results channel; emitting blocks when it is full.
    #[serde(default = "default_results_capacity")]
    pub results_capacity: usize,
}

pub(crate) fn default_results_capacity() -> usize {
    1024
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            log_level: None,
            results_capacity: default_results_capacity(),
        }
    }
}

/// `[publisher]` section. Telemetry is disabled unless `port` is set.
#[derive(Debug, Clone, Deserialize)]
pub struct PublisherSection {
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Frames kept for lagging subscribers.
    #[serde(default = "default_buffer")]
    pub buffer: usize,
}

pub(crate) fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

pub(crate) fn default_buffer() -> usize {
    256
}

impl Default for PublisherSection {
    fn default() -> Self {
        Self {
            port: None,
            host: default_host(),
            buffer: default_buffer(),
        }
    }
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub worker: WorkerSection,
    pub publisher: PublisherSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(worker: WorkerSection, publisher: PublisherSection) -> Self {
        Self { worker, publisher }
    }
}
