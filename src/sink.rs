// src/sink.rs

//! Result sink abstraction.
//!
//! A sink names the procedure its results belong to, carries that
//! procedure's parameters, and persists result records. The caller owns the
//! sink; the worker and the recorder only hold a shared reference to it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

/// Procedure parameters, keyed by name.
pub type Parameters = BTreeMap<String, Value>;

/// Destination for persisted results.
pub trait ResultSink: Send {
    /// Identifier of the procedure in the [`crate::ProcedureRegistry`].
    fn procedure_id(&self) -> &str;

    /// Parameters handed to the procedure factory.
    fn parameters(&self) -> &Parameters;

    /// Persist one result record. Called once per record, in emission order.
    fn persist(&mut self, record: &Value) -> anyhow::Result<()>;
}

/// How sinks are shared between the caller, the worker and the recorder.
pub type SharedSink = Arc<Mutex<dyn ResultSink>>;
