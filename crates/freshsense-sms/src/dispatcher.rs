use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use freshsense_domain::{DomainError, DomainResult, NotificationDispatcher};

/// TextBee SMS gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBeeConfig {
    pub api_url: String,
    pub gateway_device_id: String,
    pub api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendSmsRequest {
    recipients: Vec<String>,
    message: String,
}

/// SMS dispatcher over the TextBee HTTP API. Any transport error or non-2xx
/// response is a dispatch failure; the caller records it on the alert row.
pub struct TextBeeDispatcher {
    http: reqwest::Client,
    config: TextBeeConfig,
}

impl TextBeeDispatcher {
    pub fn new(config: TextBeeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl NotificationDispatcher for TextBeeDispatcher {
    async fn send(&self, recipients: Vec<String>, message: String) -> DomainResult<()> {
        let url = format!(
            "{}/{}/send-sms",
            self.config.api_url, self.config.gateway_device_id
        );
        let recipient_count = recipients.len();

        debug!(recipient_count, "Sending alert SMS");

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .json(&SendSmsRequest {
                recipients,
                message,
            })
            .send()
            .await
            .context("SMS gateway request failed")
            .map_err(DomainError::RepositoryError)?;

        if !response.status().is_success() {
            return Err(DomainError::RepositoryError(anyhow!(
                "SMS gateway returned status {}",
                response.status()
            )));
        }

        info!(recipient_count, "Alert SMS sent");
        Ok(())
    }
}
