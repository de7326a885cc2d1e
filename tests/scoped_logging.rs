// tests/scoped_logging.rs

use std::error::Error;
use std::time::Duration;

use labrun::events::log_channel;
use labrun::{JoinState, LogLevel, Worker, WorkerOptions};
use labrun_test_utils::monitor::{drain_monitor, queued_logs};
use labrun_test_utils::scripted::ScriptBuilder;
use labrun_test_utils::sinks::MemorySink;
use labrun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn supplied_log_channel_receives_run_logs_only() -> TestResult {
    init_tracing();

    let registry = ScriptBuilder::new()
        .log("calibrating stage")
        .progress(10.0)
        .registry("stage");
    let (_sink, shared) = MemorySink::new("stage").shared();
    let (log_tx, mut log_rx) = log_channel();

    let options = WorkerOptions::default()
        .with_log_level(LogLevel::Info)
        .with_log_channel(log_tx);
    let worker = Worker::new(shared, &registry, options)?;
    let mut handle = worker.start()?;

    tracing::info!("outside the worker run");
    assert_eq!(handle.join(Duration::from_secs(5)).await, JoinState::Finished);

    let messages: Vec<String> = queued_logs(&mut log_rx)
        .into_iter()
        .map(|r| r.message)
        .collect();

    assert!(messages.iter().any(|m| m.starts_with("worker started")));
    assert!(messages.iter().any(|m| m == "calibrating stage"));
    assert!(messages.iter().any(|m| m.contains("worker finished")));
    assert!(!messages.iter().any(|m| m.contains("outside the worker run")));
    // Debug lines are filtered at info.
    assert!(!messages.iter().any(|m| m.contains("emitting message")));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn debug_level_includes_routing_details() -> TestResult {
    init_tracing();

    let registry = ScriptBuilder::new().progress(10.0).registry("stage");
    let (_sink, shared) = MemorySink::new("stage").shared();

    let options = WorkerOptions::default().with_log_level(LogLevel::Debug);
    let mut worker = Worker::new(shared, &registry, options)?;
    let mut log_rx = worker.take_log().expect("log receiver");
    let mut handle = worker.start()?;
    assert_eq!(handle.join(Duration::from_secs(5)).await, JoinState::Finished);

    let records = queued_logs(&mut log_rx);
    let routing = records
        .iter()
        .find(|r| r.message.contains("emitting message"))
        .expect("debug routing line");
    assert_eq!(routing.level, "DEBUG");
    assert!(routing.target.starts_with("labrun"));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn log_lines_are_mirrored_on_the_monitor() -> TestResult {
    init_tracing();

    let registry = ScriptBuilder::new()
        .log("magnet at setpoint")
        .registry("magnet");
    let (_sink, shared) = MemorySink::new("magnet").shared();

    let options = WorkerOptions::default().with_log_level(LogLevel::Warn);
    let mut worker = Worker::new(shared, &registry, options)?;
    let mut monitor = worker.take_monitor().expect("monitor receiver");
    let mut handle = worker.start()?;
    assert_eq!(handle.join(Duration::from_secs(5)).await, JoinState::Finished);

    let seen = with_timeout(drain_monitor(&mut monitor)).await;
    // Info lines are below the configured level.
    assert!(seen.log_messages().is_empty());
    assert!(seen.closed);

    let registry = ScriptBuilder::new()
        .log("magnet at setpoint")
        .registry("magnet");
    let (_sink, shared) = MemorySink::new("magnet").shared();

    let options = WorkerOptions::default().with_log_level(LogLevel::Info);
    let mut worker = Worker::new(shared, &registry, options)?;
    let mut monitor = worker.take_monitor().expect("monitor receiver");
    let mut handle = worker.start()?;
    assert_eq!(handle.join(Duration::from_secs(5)).await, JoinState::Finished);

    let seen = with_timeout(drain_monitor(&mut monitor)).await;
    assert!(seen.log_messages().iter().any(|m| m == "magnet at setpoint"));

    Ok(())
}
