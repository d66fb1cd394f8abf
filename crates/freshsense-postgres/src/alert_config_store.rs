use async_trait::async_trait;
use tracing::{debug, info};

use freshsense_domain::{
    AlertConfig, AlertConfigStore, DomainError, DomainResult, UpdateAlertConfigInput,
};

use crate::client::PostgresClient;

const GLOBAL_CONFIG_KEY: &str = "GLOBAL";

/// PostgreSQL implementation of AlertConfigStore. A single row keyed
/// "GLOBAL" holds the configuration; it is created with defaults on first
/// access.
#[derive(Clone)]
pub struct PostgresAlertConfigStore {
    client: PostgresClient,
}

impl PostgresAlertConfigStore {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AlertConfigStore for PostgresAlertConfigStore {
    async fn get_global(&self) -> DomainResult<AlertConfig> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let defaults = AlertConfig::default();

        // Self-initializing: insert defaults if absent, then read whichever
        // row won. Safe under concurrent first access.
        conn.execute(
            "INSERT INTO alert_config (config_key, freshness_threshold, cooldown_minutes)
             VALUES ($1, $2, $3)
             ON CONFLICT (config_key) DO NOTHING",
            &[
                &GLOBAL_CONFIG_KEY,
                &defaults.freshness_threshold,
                &defaults.cooldown_minutes,
            ],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let row = conn
            .query_one(
                "SELECT freshness_threshold, cooldown_minutes
                 FROM alert_config WHERE config_key = $1",
                &[&GLOBAL_CONFIG_KEY],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let config = AlertConfig {
            freshness_threshold: row.get(0),
            cooldown_minutes: row.get(1),
        };
        debug!(
            freshness_threshold = config.freshness_threshold,
            cooldown_minutes = config.cooldown_minutes,
            "Loaded alert config"
        );
        Ok(config)
    }

    async fn update(&self, input: UpdateAlertConfigInput) -> DomainResult<AlertConfig> {
        // Ensure the row exists before applying a partial update
        let current = self.get_global().await?;

        let freshness_threshold = input.freshness_threshold.unwrap_or(current.freshness_threshold);
        let cooldown_minutes = input.cooldown_minutes.unwrap_or(current.cooldown_minutes);

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        conn.execute(
            "UPDATE alert_config SET freshness_threshold = $1, cooldown_minutes = $2
             WHERE config_key = $3",
            &[&freshness_threshold, &cooldown_minutes, &GLOBAL_CONFIG_KEY],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        info!(
            freshness_threshold,
            cooldown_minutes, "Updated alert config"
        );

        Ok(AlertConfig {
            freshness_threshold,
            cooldown_minutes,
        })
    }
}
