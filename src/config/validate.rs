// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{LabrunError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = LabrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.worker, raw.publisher))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_worker(cfg)?;
    validate_publisher(cfg)?;
    Ok(())
}

fn validate_worker(cfg: &RawConfigFile) -> Result<()> {
    // log_level is strongly typed and validated during deserialization.
    if cfg.worker.results_capacity == 0 {
        return Err(LabrunError::ConfigError(
            "[worker].results_capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_publisher(cfg: &RawConfigFile) -> Result<()> {
    if cfg.publisher.buffer == 0 {
        return Err(LabrunError::ConfigError(
            "[publisher].buffer must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
