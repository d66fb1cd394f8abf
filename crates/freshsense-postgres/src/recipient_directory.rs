use async_trait::async_trait;
use tracing::debug;

use freshsense_domain::{DomainError, DomainResult, RecipientDirectory};

use crate::client::PostgresClient;

/// PostgreSQL implementation of RecipientDirectory: phone numbers of all
/// administrators that have one configured.
#[derive(Clone)]
pub struct PostgresRecipientDirectory {
    client: PostgresClient,
}

impl PostgresRecipientDirectory {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecipientDirectory for PostgresRecipientDirectory {
    async fn list_alert_recipients(&self) -> DomainResult<Vec<String>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                "SELECT phone_number FROM users
                 WHERE role = 'admin' AND phone_number IS NOT NULL AND phone_number <> ''",
                &[],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let recipients: Vec<String> = rows.iter().map(|row| row.get(0)).collect();
        debug!(count = recipients.len(), "Resolved alert recipients");
        Ok(recipients)
    }
}
