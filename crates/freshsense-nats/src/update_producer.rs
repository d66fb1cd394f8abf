use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, info};

use freshsense_domain::{DomainError, DomainResult, FreshnessOverview, FreshnessUpdatePublisher};

/// NATS producer for live freshness updates. Each unit gets its own subject
/// under the base subject so dashboards can subscribe per unit.
pub struct FreshnessUpdateProducer {
    client: async_nats::Client,
    base_subject: String,
}

impl FreshnessUpdateProducer {
    pub fn new(client: async_nats::Client, base_subject: String) -> Self {
        info!(base_subject = %base_subject, "Created FreshnessUpdateProducer");
        Self {
            client,
            base_subject,
        }
    }
}

#[async_trait]
impl FreshnessUpdatePublisher for FreshnessUpdateProducer {
    async fn publish(&self, update: FreshnessOverview) -> DomainResult<()> {
        let subject = format!("{}.{}", self.base_subject, update.unit_id);

        let payload = serde_json::to_vec(&update)
            .context("Failed to serialize freshness update")
            .map_err(DomainError::RepositoryError)?;

        debug!(
            subject = %subject,
            unit_id = update.unit_id,
            size_bytes = payload.len(),
            "Publishing freshness update"
        );

        self.client
            .publish(subject, payload.into())
            .await
            .context("Failed to publish freshness update")
            .map_err(DomainError::RepositoryError)?;

        Ok(())
    }
}
