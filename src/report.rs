/// Per-operation outcome reporting.
///
/// The driver never retains records; every completed operation is handed
/// to an [`OutcomeSink`] immediately. The serialized field names are the
/// reporting boundary shared with the external aggregator.
use serde::Serialize;
use tokio::sync::mpsc;

/// Measurement for one completed operation.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRecord {
    pub request_type: String,
    pub name: String,
    pub response_time_ms: f64,
    pub response_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutcomeRecord {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Receives outcome records from virtual clients. Implementations must
/// never block the reporting client for long and must tolerate being
/// called from many tasks at once.
pub trait OutcomeSink: Send + Sync {
    fn record(&self, outcome: OutcomeRecord);
}

/// Sink that forwards records over an unbounded channel to whatever
/// consumes them (the CLI summary collector, or an external aggregator).
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<OutcomeRecord>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutcomeRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OutcomeSink for ChannelReporter {
    fn record(&self, outcome: OutcomeRecord) {
        // A dropped receiver must never stop a client's loop.
        let _ = self.tx.send(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(error: Option<&str>) -> OutcomeRecord {
        OutcomeRecord {
            request_type: "PUT".into(),
            name: "kv_put".into(),
            response_time_ms: 1.25,
            response_length: 3,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn serializes_with_aggregator_field_names() {
        let json = serde_json::to_value(sample(None)).unwrap();
        assert_eq!(json["request_type"], "PUT");
        assert_eq!(json["name"], "kv_put");
        assert_eq!(json["response_time_ms"], 1.25);
        assert_eq!(json["response_length"], 3);
        assert!(json.get("error").is_none());

        let json = serde_json::to_value(sample(Some("ERROR: boom"))).unwrap();
        assert_eq!(json["error"], "ERROR: boom");
    }

    #[test]
    fn failed_mirrors_error_presence() {
        assert!(!sample(None).failed());
        assert!(sample(Some("Key not found")).failed());
    }

    #[tokio::test]
    async fn channel_reporter_forwards_records() {
        let (reporter, mut rx) = ChannelReporter::new();
        reporter.record(sample(None));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.request_type, "PUT");
    }

    #[tokio::test]
    async fn dropped_receiver_is_tolerated() {
        let (reporter, rx) = ChannelReporter::new();
        drop(rx);
        reporter.record(sample(None));
    }
}
