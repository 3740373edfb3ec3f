/// TCP session implementation.
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::AppError;
use crate::target::{ConnectionTarget, TargetCell};
use crate::transport::{Connector, SessionOptions, Transport, TransportError};

/// One persistent TCP connection to the server under test.
#[derive(Debug)]
pub struct TcpSession {
    stream: TcpStream,
    read_buf: Vec<u8>,
    read_timeout: Option<std::time::Duration>,
}

impl TcpSession {
    /// Connect to the target with Nagle buffering disabled, so small
    /// command/response pairs are not batched and per-request latency
    /// stays observable.
    pub async fn open(
        target: &ConnectionTarget,
        options: &SessionOptions,
    ) -> Result<Self, TransportError> {
        let addr = target.addr();
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| TransportError::Connect {
                addr: addr.clone(),
                source,
            })?;
        stream
            .set_nodelay(true)
            .map_err(|source| TransportError::Connect { addr, source })?;
        Ok(Self {
            stream,
            read_buf: vec![0u8; options.read_buffer_size],
            read_timeout: options.read_timeout,
        })
    }
}

#[async_trait::async_trait]
impl Transport for TcpSession {
    async fn exchange(&mut self, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.stream
            .write_all(payload)
            .await
            .map_err(TransportError::Write)?;

        let read = self.stream.read(&mut self.read_buf);
        let n = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| TransportError::Timeout(limit))?
                .map_err(TransportError::Read)?,
            None => read.await.map_err(TransportError::Read)?,
        };
        Ok(self.read_buf[..n].to_vec())
    }

    async fn close(&mut self) {
        // Best effort; the peer may already be gone.
        let _ = self.stream.shutdown().await;
    }
}

/// Connector used by the load driver: resolves the shared target
/// (idempotently) and opens a fresh session per virtual client.
pub struct TcpConnector {
    target_spec: Option<String>,
    cell: Arc<TargetCell>,
    options: SessionOptions,
}

impl TcpConnector {
    pub fn new(target_spec: Option<String>, cell: Arc<TargetCell>, options: SessionOptions) -> Self {
        Self {
            target_spec,
            cell,
            options,
        }
    }
}

#[async_trait::async_trait]
impl Connector for TcpConnector {
    type Session = TcpSession;

    async fn connect(&self) -> Result<TcpSession, AppError> {
        let target = self.cell.resolve(self.target_spec.as_deref())?;
        Ok(TcpSession::open(&target, &self.options).await?)
    }
}
