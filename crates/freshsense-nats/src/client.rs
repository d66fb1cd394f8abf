use anyhow::{Context, Result};
use tracing::info;

/// Thin NATS client wrapper. Live updates use plain core NATS publishes;
/// subscribers that miss a message just wait for the next reading.
pub struct NatsClient {
    client: async_nats::Client,
}

impl NatsClient {
    pub async fn connect(url: &str, timeout: std::time::Duration) -> Result<Self> {
        info!(url = %url, timeout_ms = timeout.as_millis() as u64, "Connecting to NATS");

        let client = async_nats::ConnectOptions::new()
            .connection_timeout(timeout)
            .connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Successfully connected to NATS");
        Ok(Self { client })
    }

    pub fn client(&self) -> async_nats::Client {
        self.client.clone()
    }
}
