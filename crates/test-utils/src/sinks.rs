use std::sync::{Arc, Mutex};

use anyhow::bail;
use labrun::{Parameters, ResultSink, SharedSink};
use serde_json::Value;

/// A sink that keeps every persisted record in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    procedure_id: String,
    parameters: Parameters,
    pub records: Vec<Value>,
    /// Fail the persist call for this record index (0-based), if set.
    pub fail_at: Option<usize>,
}

impl MemorySink {
    pub fn new(procedure_id: &str) -> Self {
        Self {
            procedure_id: procedure_id.to_string(),
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, name: &str, value: Value) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }

    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Wrap into a shared handle, returning the typed handle for inspection
    /// and the type-erased one for the worker.
    pub fn shared(self) -> (Arc<Mutex<MemorySink>>, SharedSink) {
        let typed = Arc::new(Mutex::new(self));
        let erased: SharedSink = typed.clone();
        (typed, erased)
    }
}

impl ResultSink for MemorySink {
    fn procedure_id(&self) -> &str {
        &self.procedure_id
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn persist(&mut self, record: &Value) -> anyhow::Result<()> {
        if self.fail_at == Some(self.records.len()) {
            bail!("disk full while writing record {}", self.records.len());
        }
        self.records.push(record.clone());
        Ok(())
    }
}

/// Records persisted so far.
pub fn persisted(sink: &Arc<Mutex<MemorySink>>) -> Vec<Value> {
    sink.lock().unwrap().records.clone()
}
