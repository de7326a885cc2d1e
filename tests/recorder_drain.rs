// tests/recorder_drain.rs

use std::error::Error;
use std::time::Duration;

use serde_json::json;
use tokio::runtime::Handle;

use labrun::events::{RecorderMessage, results_channel};
use labrun::recorder::Recorder;
use labrun::{JoinState, TaskStatus, Worker, WorkerOptions};
use labrun_test_utils::monitor::drain_monitor;
use labrun_test_utils::scripted::ScriptBuilder;
use labrun_test_utils::sinks::{MemorySink, persisted};
use labrun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn drain_persists_in_order_and_stops_at_sentinel() -> TestResult {
    let (tx, rx) = results_channel(8);
    let (sink, shared) = MemorySink::new("iv-sweep").shared();

    for i in 0..3 {
        tx.try_send(RecorderMessage::Record(json!({ "n": i })))?;
    }
    tx.try_send(RecorderMessage::Sentinel)?;
    tx.try_send(RecorderMessage::Record(json!({ "n": "late" })))?;

    let count = Recorder::new(rx, shared).drain()?;

    assert_eq!(count, 3);
    assert_eq!(
        persisted(&sink),
        vec![json!({ "n": 0 }), json!({ "n": 1 }), json!({ "n": 2 })]
    );
    // The receiver is gone once the recorder returned.
    assert!(tx.try_send(RecorderMessage::Sentinel).is_err());

    Ok(())
}

#[test]
fn drain_ends_when_every_sender_is_dropped() -> TestResult {
    let (tx, rx) = results_channel(4);
    let (sink, shared) = MemorySink::new("iv-sweep").shared();

    tx.try_send(RecorderMessage::Record(json!(1)))?;
    drop(tx);

    assert_eq!(Recorder::new(rx, shared).drain()?, 1);
    assert_eq!(persisted(&sink), vec![json!(1)]);

    Ok(())
}

#[test]
fn persistence_failure_stops_the_recorder() {
    let (tx, rx) = results_channel(4);
    let (sink, shared) = MemorySink::new("iv-sweep").failing_at(1).shared();

    for i in 0..3 {
        tx.try_send(RecorderMessage::Record(json!(i))).unwrap();
    }

    match Recorder::new(rx, shared).drain() {
        Err(e) => {
            let msg = format!("{e:#}");
            assert!(msg.contains("persisting record #1"));
            assert!(msg.contains("disk full while writing record 1"));
        }
        Ok(n) => panic!("Expected persistence error, got Ok({n})"),
    }

    assert_eq!(persisted(&sink), vec![json!(0)]);
    assert!(tx.try_send(RecorderMessage::Sentinel).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn spawned_recorder_can_be_joined_from_blocking_code() -> TestResult {
    init_tracing();

    let (tx, rx) = results_channel(2);
    let (sink, shared) = MemorySink::new("iv-sweep").shared();
    let runtime = Handle::current();

    let recorder = Recorder::new(rx, shared).spawn(&runtime, tracing::Dispatch::none());

    let count = tokio::task::spawn_blocking(move || {
        for i in 0..10 {
            tx.blocking_send(RecorderMessage::Record(json!(i))).unwrap();
        }
        tx.blocking_send(RecorderMessage::Sentinel).unwrap();
        recorder.join(&runtime)
    })
    .await??;

    assert_eq!(count, 10);
    assert_eq!(persisted(&sink).len(), 10);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_sink_does_not_hang_the_worker() -> TestResult {
    init_tracing();

    let mut script = ScriptBuilder::new();
    for i in 0..50 {
        script = script.record(json!({ "n": i }));
    }
    let registry = script.registry("burst");
    let (sink, shared) = MemorySink::new("burst").failing_at(3).shared();

    let options = WorkerOptions::default().with_results_capacity(1);
    let mut worker = Worker::new(shared, &registry, options)?;
    let mut monitor = worker.take_monitor().expect("monitor receiver");
    let mut handle = worker.start()?;
    assert_eq!(handle.join(Duration::from_secs(5)).await, JoinState::Finished);

    let seen = with_timeout(drain_monitor(&mut monitor)).await;
    assert!(seen.closed);
    assert_eq!(handle.status(), TaskStatus::Finished);
    assert_eq!(persisted(&sink).len(), 3);
    assert!(
        seen.log_messages()
            .iter()
            .any(|m| m.contains("recorder failed to persist record"))
    );
    // Reported before the closing marker, where monitor observers stop.
    assert!(
        seen.log_messages()
            .iter()
            .any(|m| m.contains("recorder terminated with an error"))
    );

    Ok(())
}
