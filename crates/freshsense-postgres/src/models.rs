use chrono::{DateTime, Utc};
use freshsense_domain::{Alert, Device, Product, Reading, Unit};
use tokio_postgres::Row;

/// Database row for a device
pub struct DeviceRow {
    pub id: i64,
    pub device_id: String,
    pub name: String,
    pub location: String,
    pub last_seen: Option<DateTime<Utc>>,
}

impl DeviceRow {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(0),
            device_id: row.get(1),
            name: row.get(2),
            location: row.get(3),
            last_seen: row.get(4),
        }
    }
}

impl From<DeviceRow> for Device {
    fn from(row: DeviceRow) -> Self {
        Device {
            id: row.id,
            device_id: row.device_id,
            name: row.name,
            location: row.location,
            last_seen: row.last_seen,
        }
    }
}

/// Database row for a unit joined with its optional product. Seasonal price
/// resolution happens here so the domain only ever sees the effective price.
pub struct UnitRow {
    pub id: i64,
    pub name: String,
    pub inventory_count: i32,
    pub current_price: Option<f64>,
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub base_price: Option<f64>,
    pub low_season_price: Option<f64>,
    pub mid_season_price: Option<f64>,
    pub high_season_price: Option<f64>,
    pub current_season: Option<String>,
}

impl UnitRow {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(0),
            name: row.get(1),
            inventory_count: row.get(2),
            current_price: row.get(3),
            product_id: row.get(4),
            product_name: row.get(5),
            base_price: row.get(6),
            low_season_price: row.get(7),
            mid_season_price: row.get(8),
            high_season_price: row.get(9),
            current_season: row.get(10),
        }
    }
}

impl From<UnitRow> for Unit {
    fn from(row: UnitRow) -> Self {
        let product = match (row.product_id, row.product_name, row.base_price) {
            (Some(id), Some(name), Some(base_price)) => {
                let effective_base_price = match row.current_season.as_deref() {
                    Some("low") => row.low_season_price.unwrap_or(base_price),
                    Some("high") => row.high_season_price.unwrap_or(base_price),
                    _ => row.mid_season_price.unwrap_or(base_price),
                };
                Some(Product {
                    id,
                    name,
                    effective_base_price,
                })
            }
            _ => None,
        };

        Unit {
            id: row.id,
            name: row.name,
            inventory_count: row.inventory_count,
            current_price: row.current_price,
            product,
        }
    }
}

/// Database row for a sensor reading
pub struct ReadingRow {
    pub id: i64,
    pub unit_id: i64,
    pub device_id: i64,
    pub voc: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub freshness_score: i32,
    pub computed_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl ReadingRow {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(0),
            unit_id: row.get(1),
            device_id: row.get(2),
            voc: row.get(3),
            temperature: row.get(4),
            humidity: row.get(5),
            freshness_score: row.get(6),
            computed_price: row.get(7),
            timestamp: row.get(8),
        }
    }
}

impl From<ReadingRow> for Reading {
    fn from(row: ReadingRow) -> Self {
        Reading {
            id: row.id,
            unit_id: row.unit_id,
            device_id: row.device_id,
            voc: row.voc,
            temperature: row.temperature,
            humidity: row.humidity,
            freshness_score: row.freshness_score,
            computed_price: row.computed_price,
            timestamp: row.timestamp,
        }
    }
}

/// Database row for an alert. Recipients are stored comma-joined.
pub struct AlertRow {
    pub id: i64,
    pub unit_id: i64,
    pub freshness_score: i32,
    pub message: String,
    pub recipients: String,
    pub sent: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl AlertRow {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(0),
            unit_id: row.get(1),
            freshness_score: row.get(2),
            message: row.get(3),
            recipients: row.get(4),
            sent: row.get(5),
            error_message: row.get(6),
            created_at: row.get(7),
            sent_at: row.get(8),
        }
    }
}

impl From<AlertRow> for Alert {
    fn from(row: AlertRow) -> Self {
        let recipients = if row.recipients.is_empty() {
            Vec::new()
        } else {
            row.recipients.split(',').map(str::to_string).collect()
        };

        Alert {
            id: row.id,
            unit_id: row.unit_id,
            freshness_score: row.freshness_score,
            message: row.message,
            recipients,
            sent: row.sent,
            error_message: row.error_message,
            created_at: row.created_at,
            sent_at: row.sent_at,
        }
    }
}
