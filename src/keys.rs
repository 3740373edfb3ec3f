/// Time-derived key generation.
///
/// Keys are a function of the current millisecond timestamp, shared by
/// every client in a run. A GET key is derived from one millisecond in
/// the past, so GETs probabilistically re-request a key just written by a
/// recent PUT from any client. This is a deliberate hit-rate
/// approximation, not a correctness guarantee.
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond clock, injectable for deterministic tests.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock milliseconds. Consistent across all clients in a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

#[derive(Clone)]
pub struct KeyGenerator {
    clock: Arc<dyn Clock>,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Key for a PUT, derived from the current timestamp.
    pub fn put_key(&self) -> String {
        format!("key_{}", self.clock.now_millis())
    }

    /// Key for a GET, derived from one millisecond in the past.
    pub fn get_key(&self) -> String {
        format!("key_{}", self.clock.now_millis().saturating_sub(1))
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}
