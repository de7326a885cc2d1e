// src/worker/router.rs

//! Topic-based event routing.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::errors::TelemetryError;
use crate::events::{Event, MonitorGate, RecorderMessage, ResultsSender};
use crate::publisher::Publisher;
use crate::types::Topic;

/// Fans emitted events out to the recorder, the monitor and the publisher.
///
/// - `results` goes to the recorder (blocking when the channel is full);
/// - `status`, `progress` and `error` go to the monitor;
/// - every topic is also offered to the publisher, best effort.
#[derive(Debug, Clone)]
pub struct EventRouter {
    results: ResultsSender,
    monitor: MonitorGate,
    publisher: Option<Arc<Publisher>>,
}

impl EventRouter {
    pub fn new(
        results: ResultsSender,
        monitor: MonitorGate,
        publisher: Option<Arc<Publisher>>,
    ) -> Self {
        Self {
            results,
            monitor,
            publisher,
        }
    }

    pub fn emit(&self, topic: Topic, payload: Value) {
        debug!(%topic, %payload, "emitting message");
        let event = Event::new(topic, payload);

        if let Some(publisher) = &self.publisher {
            broadcast(publisher, &event);
        }

        match topic {
            Topic::Results => {
                if self
                    .results
                    .blocking_send(RecorderMessage::Record(event.payload))
                    .is_err()
                {
                    warn!("recorder no longer accepting records; result dropped");
                }
            }
            Topic::Status | Topic::Progress | Topic::Error => {
                self.monitor.send(event);
            }
            Topic::Log => {}
        }
    }

    /// Send the recorder its sentinel. The monitor gate is closed separately,
    /// once the run has nothing left to log.
    pub fn finish_results(&self) {
        if self.results.blocking_send(RecorderMessage::Sentinel).is_err() {
            warn!("recorder already gone; sentinel not delivered");
        }
    }
}

fn broadcast(publisher: &Publisher, event: &Event) {
    match publisher.publish(event) {
        Ok(()) => {}
        Err(TelemetryError::Serialize(e)) => {
            trace!(topic = %event.topic, error = %e, "telemetry frame not serializable; skipped");
        }
        Err(TelemetryError::NoSubscribers) => {}
    }
}
