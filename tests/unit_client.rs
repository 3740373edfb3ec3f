/// Unit tests for the virtual client loop, driven through a scripted
/// mock transport.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use kvdrive::keys::KeyGenerator;
use kvdrive::report::{OutcomeRecord, OutcomeSink};
use kvdrive::simulator::client::VirtualClient;
use kvdrive::simulator::config::{OperationWeights, WorkloadConfig};
use kvdrive::transport::{Transport, TransportError};

struct MockTransport {
    responses: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
    exchanges: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl MockTransport {
    fn scripted(
        responses: Vec<Result<Vec<u8>, TransportError>>,
    ) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let exchanges = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));
        let transport = Self {
            responses: Mutex::new(VecDeque::from(responses)),
            exchanges: Arc::clone(&exchanges),
            closes: Arc::clone(&closes),
        };
        (transport, exchanges, closes)
    }
}

fn read_error() -> TransportError {
    TransportError::Read(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "connection reset by peer",
    ))
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn exchange(&mut self, _payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.responses.lock().expect("responses mutex poisoned");
        guard.pop_front().unwrap_or_else(|| Err(read_error()))
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct CollectingSink {
    records: Mutex<Vec<OutcomeRecord>>,
}

impl CollectingSink {
    fn take(&self) -> Vec<OutcomeRecord> {
        self.records.lock().expect("records mutex poisoned").clone()
    }
}

impl OutcomeSink for CollectingSink {
    fn record(&self, outcome: OutcomeRecord) {
        self.records
            .lock()
            .expect("records mutex poisoned")
            .push(outcome);
    }
}

fn workload(put: u32, get: u32) -> WorkloadConfig {
    WorkloadConfig {
        weights: OperationWeights::new(put, get).unwrap(),
        ..WorkloadConfig::default()
    }
}

fn client(
    transport: MockTransport,
    workload: WorkloadConfig,
    sink: Arc<CollectingSink>,
) -> VirtualClient<MockTransport> {
    VirtualClient::new(
        0,
        transport,
        workload,
        KeyGenerator::new(),
        sink,
        Arc::new(AtomicBool::new(false)),
    )
}

#[tokio::test]
async fn put_with_ok_response_is_successful() {
    let (transport, _, _) = MockTransport::scripted(vec![Ok(b"OK\n".to_vec())]);
    let sink = Arc::new(CollectingSink::default());

    client(transport, workload(1, 0), Arc::clone(&sink))
        .run(Some(1))
        .await;

    let records = sink.take();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].request_type, "PUT");
    assert_eq!(records[0].name, "kv_put");
    assert!(!records[0].failed());
}

#[tokio::test]
async fn get_with_empty_response_fails_the_heuristic() {
    let (transport, _, _) = MockTransport::scripted(vec![Ok(Vec::new())]);
    let sink = Arc::new(CollectingSink::default());

    client(transport, workload(0, 1), Arc::clone(&sink))
        .run(Some(1))
        .await;

    let records = sink.take();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].error.as_deref(), Some("Key not found"));
}

#[tokio::test]
async fn transport_failure_yields_one_record_and_the_loop_continues() {
    let (transport, exchanges, _) =
        MockTransport::scripted(vec![Err(read_error()), Ok(b"value\n".to_vec())]);
    let sink = Arc::new(CollectingSink::default());

    client(transport, workload(0, 1), Arc::clone(&sink))
        .run(Some(2))
        .await;

    let records = sink.take();
    assert_eq!(records.len(), 2);
    assert!(records[0].failed());
    let message = records[0].error.as_deref().unwrap();
    assert!(message.starts_with("ERROR: "));
    assert!(!message["ERROR: ".len()..].is_empty());

    // The subsequent operation was still attempted and succeeded.
    assert_eq!(exchanges.load(Ordering::SeqCst), 2);
    assert!(!records[1].failed());
}

#[tokio::test]
async fn session_is_closed_exactly_once_even_when_every_send_fails() {
    let (transport, exchanges, closes) = MockTransport::scripted(Vec::new());
    let sink = Arc::new(CollectingSink::default());

    client(transport, workload(1, 1), Arc::clone(&sink))
        .run(Some(3))
        .await;

    assert_eq!(exchanges.load(Ordering::SeqCst), 3);
    assert_eq!(closes.load(Ordering::SeqCst), 1);

    let records = sink.take();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.failed()));
}

#[tokio::test]
async fn raised_stop_flag_halts_before_any_operation_but_still_closes() {
    let (transport, exchanges, closes) = MockTransport::scripted(vec![Ok(b"OK\n".to_vec())]);
    let sink = Arc::new(CollectingSink::default());
    let stop = Arc::new(AtomicBool::new(true));

    let client = VirtualClient::new(
        0,
        transport,
        workload(1, 1),
        KeyGenerator::new(),
        Arc::clone(&sink) as Arc<dyn OutcomeSink>,
        stop,
    );
    client.run(None).await;

    assert_eq!(exchanges.load(Ordering::SeqCst), 0);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn zero_put_weight_selects_only_gets() {
    let responses = (0..10).map(|_| Ok(b"value\n".to_vec())).collect();
    let (transport, _, _) = MockTransport::scripted(responses);
    let sink = Arc::new(CollectingSink::default());

    client(transport, workload(0, 1), Arc::clone(&sink))
        .run(Some(10))
        .await;

    let records = sink.take();
    assert_eq!(records.len(), 10);
    assert!(records.iter().all(|r| r.request_type == "GET"));
}
