/// One simulated end-user session.
///
/// A virtual client owns a private transport session for its whole
/// lifetime and loops: select a weighted operation, encode it, time the
/// round trip, report the outcome, pause for a sampled think time. No
/// per-operation failure ever stops the loop; only the shared stop flag
/// or an exhausted request budget does. The session is closed exactly
/// once on every exit path.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::keys::KeyGenerator;
use crate::protocol::{self, OpKind, Operation};
use crate::report::{OutcomeRecord, OutcomeSink};
use crate::simulator::config::WorkloadConfig;
use crate::transport::{Transport, TransportError};

pub struct VirtualClient<T: Transport> {
    id: usize,
    session: T,
    workload: WorkloadConfig,
    keys: KeyGenerator,
    sink: Arc<dyn OutcomeSink>,
    stop: Arc<AtomicBool>,
}

impl<T: Transport> VirtualClient<T> {
    pub fn new(
        id: usize,
        session: T,
        workload: WorkloadConfig,
        keys: KeyGenerator,
        sink: Arc<dyn OutcomeSink>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            session,
            workload,
            keys,
            sink,
            stop,
        }
    }

    /// Run the operation loop until the stop flag is raised or the
    /// budget is spent, then close the session.
    pub async fn run(mut self, budget: Option<usize>) {
        let mut remaining = budget;
        loop {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            if remaining == Some(0) {
                break;
            }

            let op = self.next_operation();
            let payload =
                protocol::encode(&op, self.workload.wire_format, self.workload.length_mode);

            let started = Instant::now();
            let result = self.session.exchange(&payload).await;
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

            let outcome = judge(&op, result, elapsed_ms);
            if let Some(error) = &outcome.error {
                log::debug!("client {}: {} -> {}", self.id, op.request_type(), error);
            }
            self.sink.record(outcome);

            if let Some(n) = remaining.as_mut() {
                *n -= 1;
            }
            if let Some(think_time) = self.workload.think_time {
                tokio::time::sleep(think_time.sample()).await;
            }
        }
        self.session.close().await;
    }

    fn next_operation(&self) -> Operation {
        let roll = fastrand::u64(0..self.workload.weights.total());
        match self.workload.weights.choose(roll) {
            OpKind::Put => Operation::Put {
                key: self.keys.put_key(),
                value: self.workload.value.clone(),
            },
            OpKind::Get => Operation::Get {
                key: self.keys.get_key(),
            },
        }
    }
}

/// Convert an exchange result into an outcome record.
///
/// Success is a heuristic, not a protocol status: a PUT succeeded iff the
/// response contains `"OK"`, a GET iff the response is non-empty.
fn judge(
    op: &Operation,
    result: Result<Vec<u8>, TransportError>,
    elapsed_ms: f64,
) -> OutcomeRecord {
    match result {
        Ok(response) => {
            let text = String::from_utf8_lossy(&response);
            let error = match op {
                Operation::Put { .. } if text.contains("OK") => None,
                Operation::Put { .. } => Some("PUT command failed".to_string()),
                Operation::Get { .. } if !response.is_empty() => None,
                Operation::Get { .. } => Some("Key not found".to_string()),
            };
            OutcomeRecord {
                request_type: op.request_type().to_string(),
                name: op.label().to_string(),
                response_time_ms: elapsed_ms,
                response_length: response.len(),
                error,
            }
        }
        Err(err) => OutcomeRecord {
            request_type: op.request_type().to_string(),
            name: op.label().to_string(),
            response_time_ms: elapsed_ms,
            response_length: 0,
            error: Some(format!("ERROR: {}", err)),
        },
    }
}
