use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::pricing::FreshnessStatus;

/// Domain representation of a sensor device.
///
/// Devices are identified by an opaque external id (e.g. "ESP32-001")
/// reported by the hardware, not by the numeric row id.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: i64,
    pub device_id: String,
    pub name: String,
    pub location: String,
    pub last_seen: Option<DateTime<Utc>>,
}

/// Product attached to a unit. The effective base price is already
/// season-adjusted by the store that loads it.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub effective_base_price: f64,
}

/// Inventory unit under freshness monitoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: i64,
    pub name: String,
    pub inventory_count: i32,
    pub current_price: Option<f64>,
    pub product: Option<Product>,
}

/// Immutable sensor reading, created exactly once per ingested event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
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

/// Input for persisting a reading. Implementations store the reading and
/// overwrite the unit's current price in the same transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateReadingInput {
    pub unit_id: i64,
    pub device_id: i64,
    pub voc: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub freshness_score: i32,
    pub computed_price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Input for registering a device by its external id. Missing name or
/// location fall back to placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDeviceInput {
    pub device_id: String,
    pub name: Option<String>,
    pub location: Option<String>,
}

/// Globally shared alert configuration. Read fresh on every alert decision
/// since administrators can change it between readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    pub freshness_threshold: i32,
    pub cooldown_minutes: i32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            freshness_threshold: 60,
            cooldown_minutes: 30,
        }
    }
}

/// Partial update for the global alert configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateAlertConfigInput {
    pub freshness_threshold: Option<i32>,
    pub cooldown_minutes: Option<i32>,
}

/// A raised freshness alert. Immutable after creation; `sent`, `sent_at` and
/// `error_message` are fixed once by the dispatch attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: i64,
    pub unit_id: i64,
    pub freshness_score: i32,
    pub message: String,
    pub recipients: Vec<String>,
    pub sent: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateAlertInput {
    pub unit_id: i64,
    pub freshness_score: i32,
    pub message: String,
    pub recipients: Vec<String>,
    pub sent: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Raw ingestion event, transport-agnostic. Absent numeric fields are a
/// validation failure at the transport boundary, never silently defaulted.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct IngestReadingInput {
    #[garde(range(min = 1))]
    pub unit_id: i64,
    #[garde(length(min = 1))]
    pub device_id: String,
    #[garde(custom(finite))]
    pub voc: f64,
    #[garde(custom(finite))]
    pub temperature: f64,
    #[garde(custom(finite))]
    pub humidity: f64,
    /// Defaults to ingestion time when the transport supplies none.
    #[garde(skip)]
    pub timestamp: Option<DateTime<Utc>>,
}

fn finite(value: &f64, _ctx: &()) -> garde::Result {
    if value.is_finite() {
        Ok(())
    } else {
        Err(garde::Error::new("must be a finite number"))
    }
}

/// Read-only freshness view for a unit, also used as the live-update
/// broadcast payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreshnessOverview {
    pub unit_id: i64,
    pub unit_name: String,
    pub product_name: String,
    pub inventory_count: i32,
    pub current_price: Option<f64>,
    pub latest_freshness_score: Option<i32>,
    pub voc: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub latest_reading_timestamp: Option<DateTime<Utc>>,
    pub freshness_status: Option<FreshnessStatus>,
    pub discount_percentage: Option<i32>,
}
