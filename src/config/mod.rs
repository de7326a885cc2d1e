// src/config/mod.rs

//! Configuration loading and validation for labrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like non-zero capacities (`validate.rs`).
//! - Turn a validated file into [`WorkerOptions`] (`options.rs`).

pub mod loader;
pub mod model;
pub mod options;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, PublisherSection, RawConfigFile, WorkerSection};
pub use options::WorkerOptions;
