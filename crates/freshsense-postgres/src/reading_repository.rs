use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use freshsense_domain::{
    CreateReadingInput, DomainError, DomainResult, Reading, ReadingRepository,
};

use crate::client::PostgresClient;
use crate::models::ReadingRow;

const READING_COLUMNS: &str =
    "id, unit_id, device_id, voc, temperature, humidity, freshness_score, computed_price, read_at";

/// PostgreSQL implementation of ReadingRepository
#[derive(Clone)]
pub struct PostgresReadingRepository {
    client: PostgresClient,
}

impl PostgresReadingRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReadingRepository for PostgresReadingRepository {
    async fn record(&self, input: CreateReadingInput) -> DomainResult<Reading> {
        let mut conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        // Reading insert and unit price update commit together; a failure of
        // either leaves both untouched.
        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let row = tx
            .query_one(
                &format!(
                    "INSERT INTO sensor_readings
                         (unit_id, device_id, voc, temperature, humidity,
                          freshness_score, computed_price, read_at)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                     RETURNING {READING_COLUMNS}"
                ),
                &[
                    &input.unit_id,
                    &input.device_id,
                    &input.voc,
                    &input.temperature,
                    &input.humidity,
                    &input.freshness_score,
                    &input.computed_price,
                    &input.timestamp,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        tx.execute(
            "UPDATE units SET current_price = $1 WHERE id = $2",
            &[&input.computed_price, &input.unit_id],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(
            unit_id = input.unit_id,
            freshness_score = input.freshness_score,
            computed_price = input.computed_price,
            "Recorded reading and updated unit price"
        );

        Ok(ReadingRow::from_row(&row).into())
    }

    async fn latest_for_unit(&self, unit_id: i64) -> DomainResult<Option<Reading>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!(
                    "SELECT {READING_COLUMNS} FROM sensor_readings
                     WHERE unit_id = $1 ORDER BY read_at DESC LIMIT 1"
                ),
                &[&unit_id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.map(|row| ReadingRow::from_row(&row).into()))
    }

    async fn list_recent(&self, unit_id: i64, limit: i64) -> DomainResult<Vec<Reading>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                &format!(
                    "SELECT {READING_COLUMNS} FROM sensor_readings
                     WHERE unit_id = $1 ORDER BY read_at DESC LIMIT $2"
                ),
                &[&unit_id, &limit],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows
            .iter()
            .map(|row| ReadingRow::from_row(row).into())
            .collect())
    }

    async fn list_range(
        &self,
        unit_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<Reading>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let rows = conn
            .query(
                &format!(
                    "SELECT {READING_COLUMNS} FROM sensor_readings
                     WHERE unit_id = $1 AND read_at BETWEEN $2 AND $3
                     ORDER BY read_at DESC"
                ),
                &[&unit_id, &start, &end],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(rows
            .iter()
            .map(|row| ReadingRow::from_row(row).into())
            .collect())
    }
}
