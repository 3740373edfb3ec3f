/// Load driver: spawns and supervises the virtual clients.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::AppError;
use crate::keys::KeyGenerator;
use crate::report::OutcomeSink;
use crate::simulator::client::VirtualClient;
use crate::simulator::config::DriverConfig;
use crate::transport::Connector;

pub struct Simulator {
    config: DriverConfig,
}

impl Simulator {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Drive the configured number of virtual clients to completion.
    ///
    /// Each client runs as an independent task owning a private session
    /// obtained from the connector. A duration-configured run raises the
    /// shared stop flag when the deadline passes; clients honor it
    /// between operations, so the in-flight exchange always completes (or
    /// fails) first and every session is closed before its task ends.
    pub async fn run<C>(&self, connector: Arc<C>, sink: Arc<dyn OutcomeSink>) -> Result<(), AppError>
    where
        C: Connector + 'static,
        C::Session: Send + 'static,
    {
        self.config.validate().map_err(AppError::Config)?;

        let stop = Arc::new(AtomicBool::new(false));
        let budget = self.config.requests_per_client;

        let mut handles = Vec::with_capacity(self.config.clients);
        for id in 0..self.config.clients {
            let connector = Arc::clone(&connector);
            let sink = Arc::clone(&sink);
            let stop = Arc::clone(&stop);
            let workload = self.config.workload.clone();

            handles.push(tokio::spawn(async move {
                let session = match connector.connect().await {
                    Ok(session) => session,
                    Err(err) => {
                        log::warn!("client {}: connect failed: {}", id, err);
                        return;
                    }
                };
                let client = VirtualClient::new(
                    id,
                    session,
                    workload,
                    KeyGenerator::new(),
                    sink,
                    stop,
                );
                client.run(budget).await;
            }));
        }

        let timer = self.config.duration.map(|deadline| {
            let stop = Arc::clone(&stop);
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                stop.store(true, Ordering::Relaxed);
            })
        });

        for handle in handles {
            if let Err(err) = handle.await {
                log::warn!("client task join error: {}", err);
            }
        }
        if let Some(timer) = timer {
            timer.abort();
        }
        Ok(())
    }
}
