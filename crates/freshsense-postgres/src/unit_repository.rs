use async_trait::async_trait;
use tracing::debug;

use freshsense_domain::{DomainError, DomainResult, Unit, UnitRepository};

use crate::client::PostgresClient;
use crate::models::UnitRow;

const SELECT_UNIT: &str = "SELECT u.id, u.unit_name, u.inventory_count, u.current_price,
        p.id, p.product_name, p.base_price,
        p.low_season_price, p.mid_season_price, p.high_season_price, p.current_season
 FROM units u
 LEFT JOIN products p ON p.id = u.product_id
 WHERE u.id = $1";

/// PostgreSQL implementation of UnitRepository
#[derive(Clone)]
pub struct PostgresUnitRepository {
    client: PostgresClient,
}

impl PostgresUnitRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UnitRepository for PostgresUnitRepository {
    async fn get_unit(&self, unit_id: i64) -> DomainResult<Option<Unit>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(SELECT_UNIT, &[&unit_id])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => {
                debug!(unit_id, "Loaded unit");
                Ok(Some(UnitRow::from_row(&row).into()))
            }
            None => Ok(None),
        }
    }
}
