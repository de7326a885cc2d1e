// tests/worker_construction.rs

use anyhow::bail;
use serde_json::json;

use labrun::events::log_channel;
use labrun::{LabrunError, Parameters, Procedure, ProcedureRegistry, Worker, WorkerOptions};
use labrun_test_utils::scripted::ScriptBuilder;
use labrun_test_utils::sinks::{persisted, MemorySink};

#[test]
fn sink_naming_unknown_procedure_is_a_construction_error() {
    let registry = ScriptBuilder::new().registry("iv-sweep");
    let (sink, shared) = MemorySink::new("cv-sweep").shared();

    match Worker::new(shared, &registry, WorkerOptions::default()) {
        Err(LabrunError::Construction(msg)) => {
            assert!(msg.contains("unknown procedure"));
            assert!(msg.contains("cv-sweep"));
        }
        Err(e) => panic!("Expected Construction error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }

    assert!(persisted(&sink).is_empty());
}

#[test]
fn failing_factory_is_a_construction_error() {
    let mut registry = ProcedureRegistry::new();
    registry.register(
        "needs-port",
        |params: &Parameters| -> anyhow::Result<Box<dyn Procedure>> {
            match params.get("port") {
                Some(_) => Ok(Box::new(ScriptBuilder::new().build())),
                None => bail!("missing parameter 'port'"),
            }
        },
    );
    let (_sink, shared) = MemorySink::new("needs-port").shared();

    match Worker::new(shared, &registry, WorkerOptions::default()) {
        Err(LabrunError::Construction(msg)) => {
            assert!(msg.contains("building procedure 'needs-port'"));
            assert!(msg.contains("missing parameter 'port'"));
        }
        Err(e) => panic!("Expected Construction error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }

    let (_sink, shared) = MemorySink::new("needs-port")
        .with_parameter("port", json!("/dev/ttyUSB0"))
        .shared();
    assert!(Worker::new(shared, &registry, WorkerOptions::default()).is_ok());
}

#[test]
fn invalid_parameters_are_a_validation_error() {
    let registry = ScriptBuilder::new()
        .invalid("sweep range is empty")
        .registry("iv-sweep");
    let (_sink, shared) = MemorySink::new("iv-sweep").shared();

    match Worker::new(shared, &registry, WorkerOptions::default()) {
        Err(LabrunError::Validation(msg)) => {
            assert!(msg.contains("sweep range is empty"));
        }
        Err(e) => panic!("Expected Validation error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn start_outside_a_runtime_is_rejected() {
    let registry = ScriptBuilder::new().registry("iv-sweep");
    let (_sink, shared) = MemorySink::new("iv-sweep").shared();
    let worker = Worker::new(shared, &registry, WorkerOptions::default()).unwrap();

    match worker.start() {
        Err(LabrunError::Runtime(msg)) => assert!(msg.contains("Tokio runtime")),
        Err(e) => panic!("Expected Runtime error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn receivers_can_only_be_taken_once() {
    let registry = ScriptBuilder::new().registry("iv-sweep");
    let (_sink, shared) = MemorySink::new("iv-sweep").shared();
    let mut worker = Worker::new(shared, &registry, WorkerOptions::default()).unwrap();

    assert!(worker.take_monitor().is_some());
    assert!(worker.take_monitor().is_none());
    assert!(worker.take_log().is_some());
    assert!(worker.take_log().is_none());
}

#[test]
fn supplied_log_channel_replaces_the_allocated_one() {
    let registry = ScriptBuilder::new().registry("iv-sweep");
    let (_sink, shared) = MemorySink::new("iv-sweep").shared();
    let (tx, _rx) = log_channel();

    let options = WorkerOptions::default().with_log_channel(tx);
    let mut worker = Worker::new(shared, &registry, options).unwrap();

    assert!(worker.take_log().is_none());
    assert_eq!(worker.procedure_id(), "iv-sweep");
}

#[test]
fn debug_output_names_the_procedure() {
    let registry = ScriptBuilder::new().registry("iv-sweep");
    let (_sink, shared) = MemorySink::new("iv-sweep").shared();
    let options = WorkerOptions::default().with_port(5888);
    let worker = Worker::new(shared, &registry, options).unwrap();

    let repr = format!("{worker:?}");
    assert!(repr.contains("ScriptedProcedure"));
    assert!(repr.contains("5888"));
    assert!(repr.contains("should_stop: false"));
}
