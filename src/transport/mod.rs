/// Transport abstraction between a virtual client and the server under
/// test.
///
/// Each virtual client owns exactly one session for its entire lifetime;
/// sessions are never shared across tasks. I/O failures surface as
/// [`TransportError`] values and never terminate a client's loop.
pub mod tcp;

use std::time::Duration;

use thiserror::Error;

use crate::error::AppError;

pub use tcp::{TcpConnector, TcpSession};

/// I/O failures during an operation. Non-fatal: the virtual client
/// converts these into failed outcome records and keeps running.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("read timed out after {0:?}")]
    Timeout(Duration),
}

/// One persistent request-response session.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Write the full payload, then perform a single bounded read and
    /// return whatever bytes arrived. A response spanning multiple TCP
    /// segments may be truncated.
    async fn exchange(&mut self, payload: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// Release the underlying channel. Invoked exactly once when the
    /// owning client stops.
    async fn close(&mut self);
}

/// Session tuning shared by all clients in a run.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Capacity of the single bounded response read.
    pub read_buffer_size: usize,
    /// Optional cap on how long a read may block. Disabled by default to
    /// match the observed system.
    pub read_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            read_buffer_size: 4096,
            read_timeout: None,
        }
    }
}

/// Opens a session for a starting virtual client.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Session: Transport;

    async fn connect(&self) -> Result<Self::Session, AppError>;
}
