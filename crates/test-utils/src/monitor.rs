use labrun::events::{LogReceiver, MonitorReceiver};
use labrun::{Event, LogRecord, MonitorMessage, TaskStatus, Topic};
use serde_json::Value;

/// Everything a monitor observer saw up to the closing marker.
#[derive(Debug, Default)]
pub struct MonitorLog {
    pub events: Vec<Event>,
    pub closed: bool,
}

impl MonitorLog {
    pub fn topic(&self, topic: Topic) -> impl Iterator<Item = &Value> {
        self.events
            .iter()
            .filter(move |e| e.topic == topic)
            .map(|e| &e.payload)
    }

    /// Status values in the order they were emitted.
    pub fn statuses(&self) -> Vec<TaskStatus> {
        self.topic(Topic::Status)
            .map(|v| serde_json::from_value(v.clone()).expect("status payload"))
            .collect()
    }

    pub fn progress(&self) -> Vec<f64> {
        self.topic(Topic::Progress)
            .map(|v| v.as_f64().expect("progress payload"))
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.topic(Topic::Error)
            .map(|v| v.as_str().expect("error payload").to_string())
            .collect()
    }

    pub fn log_messages(&self) -> Vec<String> {
        self.topic(Topic::Log)
            .map(|v| v["message"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

/// Drain a monitor channel until its closing marker (or until the channel
/// closes). Call after the worker has been joined.
pub async fn drain_monitor(rx: &mut MonitorReceiver) -> MonitorLog {
    let mut log = MonitorLog::default();
    while let Some(msg) = rx.recv().await {
        match msg {
            MonitorMessage::Event(event) => log.events.push(event),
            MonitorMessage::Closed => {
                log.closed = true;
                break;
            }
        }
    }
    log
}

/// Collect whatever log records are currently queued.
pub fn queued_logs(rx: &mut LogReceiver) -> Vec<LogRecord> {
    let mut records = Vec::new();
    while let Ok(record) = rx.try_recv() {
        records.push(record);
    }
    records
}

/// Every message on a monitor channel, read until all senders are gone.
pub async fn drain_to_end(rx: &mut MonitorReceiver) -> Vec<MonitorMessage> {
    let mut messages = Vec::new();
    while let Some(msg) = rx.recv().await {
        messages.push(msg);
    }
    messages
}
