use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use freshsense_domain::{
    Device, DeviceRepository, DomainError, DomainResult, RegisterDeviceInput,
};

use crate::client::PostgresClient;
use crate::models::DeviceRow;

const DEVICE_COLUMNS: &str = "id, device_id, device_name, location, last_seen";

/// PostgreSQL implementation of DeviceRepository. Devices are keyed by the
/// opaque external id reported by the hardware.
#[derive(Clone)]
pub struct PostgresDeviceRepository {
    client: PostgresClient,
}

impl PostgresDeviceRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeviceRepository for PostgresDeviceRepository {
    async fn find_by_device_id(&self, device_id: &str) -> DomainResult<Option<Device>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE device_id = $1"),
                &[&device_id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.map(|row| DeviceRow::from_row(&row).into()))
    }

    async fn register(&self, input: RegisterDeviceInput) -> DomainResult<Device> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let name = input
            .name
            .unwrap_or_else(|| format!("sensor-{}", input.device_id));
        let location = input.location.unwrap_or_else(|| "Unknown".to_string());
        let now = Utc::now();

        // Idempotent upsert: concurrent registrations of the same external
        // id converge on one row.
        let row = conn
            .query_one(
                &format!(
                    "INSERT INTO devices (device_id, device_name, location, last_seen)
                     VALUES ($1, $2, $3, $4)
                     ON CONFLICT (device_id) DO UPDATE SET last_seen = EXCLUDED.last_seen
                     RETURNING {DEVICE_COLUMNS}"
                ),
                &[&input.device_id, &name, &location, &now],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(device_id = %input.device_id, "Registered device");

        Ok(DeviceRow::from_row(&row).into())
    }

    async fn touch_last_seen(&self, device_id: &str) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        conn.execute(
            "UPDATE devices SET last_seen = $1 WHERE device_id = $2",
            &[&Utc::now(), &device_id],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(())
    }
}
