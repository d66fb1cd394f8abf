use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use freshsense_domain::{Alert, AlertRepository, CreateAlertInput, DomainError, DomainResult};

use crate::client::PostgresClient;
use crate::models::AlertRow;

const ALERT_COLUMNS: &str =
    "id, unit_id, freshness_score, message, recipients, sent, error_message, created_at, sent_at";

/// PostgreSQL implementation of AlertRepository
#[derive(Clone)]
pub struct PostgresAlertRepository {
    client: PostgresClient,
}

impl PostgresAlertRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AlertRepository for PostgresAlertRepository {
    async fn most_recent_for_unit(&self, unit_id: i64) -> DomainResult<Option<Alert>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!(
                    "SELECT {ALERT_COLUMNS} FROM alerts
                     WHERE unit_id = $1 ORDER BY created_at DESC LIMIT 1"
                ),
                &[&unit_id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.map(|row| AlertRow::from_row(&row).into()))
    }

    async fn save(&self, input: CreateAlertInput) -> DomainResult<Alert> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let recipients = input.recipients.join(",");

        let row = conn
            .query_one(
                &format!(
                    "INSERT INTO alerts
                         (unit_id, freshness_score, message, recipients, sent,
                          error_message, created_at, sent_at)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                     RETURNING {ALERT_COLUMNS}"
                ),
                &[
                    &input.unit_id,
                    &input.freshness_score,
                    &input.message,
                    &recipients,
                    &input.sent,
                    &input.error_message,
                    &input.created_at,
                    &input.sent_at,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(unit_id = input.unit_id, sent = input.sent, "Saved alert");

        Ok(AlertRow::from_row(&row).into())
    }

    async fn list_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<Alert>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                &format!(
                    "SELECT {ALERT_COLUMNS} FROM alerts
                     WHERE created_at > $1 ORDER BY created_at DESC"
                ),
                &[&since],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows
            .iter()
            .map(|row| AlertRow::from_row(row).into())
            .collect())
    }

    async fn list_for_unit(&self, unit_id: i64) -> DomainResult<Vec<Alert>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                &format!(
                    "SELECT {ALERT_COLUMNS} FROM alerts
                     WHERE unit_id = $1 ORDER BY created_at DESC"
                ),
                &[&unit_id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows
            .iter()
            .map(|row| AlertRow::from_row(row).into())
            .collect())
    }
}
