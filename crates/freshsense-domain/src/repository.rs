use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DomainResult;
use crate::types::{
    Alert, AlertConfig, CreateAlertInput, CreateReadingInput, Device, FreshnessOverview,
    Reading, RegisterDeviceInput, Unit, UpdateAlertConfigInput,
};

/// Store for inventory units. The unit's product, when present, carries the
/// season-adjusted effective base price resolved by the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UnitRepository: Send + Sync {
    async fn get_unit(&self, unit_id: i64) -> DomainResult<Option<Unit>>;
}

/// Store for sensor devices, looked up by opaque external id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn find_by_device_id(&self, device_id: &str) -> DomainResult<Option<Device>>;

    /// Idempotent upsert keyed on the external device id.
    async fn register(&self, input: RegisterDeviceInput) -> DomainResult<Device>;

    async fn touch_last_seen(&self, device_id: &str) -> DomainResult<()>;
}

/// Store for sensor readings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadingRepository: Send + Sync {
    /// Persist the reading and overwrite the unit's current price with
    /// `computed_price` in a single transaction, so the stored price can
    /// never go stale relative to the stored reading.
    async fn record(&self, input: CreateReadingInput) -> DomainResult<Reading>;

    async fn latest_for_unit(&self, unit_id: i64) -> DomainResult<Option<Reading>>;

    async fn list_recent(&self, unit_id: i64, limit: i64) -> DomainResult<Vec<Reading>>;

    async fn list_range(
        &self,
        unit_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<Reading>>;
}

/// Store for alert history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn most_recent_for_unit(&self, unit_id: i64) -> DomainResult<Option<Alert>>;

    async fn save(&self, input: CreateAlertInput) -> DomainResult<Alert>;

    async fn list_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<Alert>>;

    async fn list_for_unit(&self, unit_id: i64) -> DomainResult<Vec<Alert>>;
}

/// Globally shared alert configuration. `get_global` self-initializes a
/// default row (threshold 60, cooldown 30) on first access, so a missing
/// configuration cannot occur in steady state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertConfigStore: Send + Sync {
    async fn get_global(&self) -> DomainResult<AlertConfig>;

    async fn update(&self, input: UpdateAlertConfigInput) -> DomainResult<AlertConfig>;
}

/// Resolves the current alert recipient contacts (e.g. administrator phone
/// numbers). Resolved fresh per alert so membership changes take effect
/// immediately.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    async fn list_alert_recipients(&self) -> DomainResult<Vec<String>>;
}

/// Outbound notification channel (e.g. SMS gateway). Failures are recorded
/// on the alert row by the caller, never propagated into ingestion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, recipients: Vec<String>, message: String) -> DomainResult<()>;
}

/// Fire-and-forget live-update channel for per-unit freshness broadcasts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FreshnessUpdatePublisher: Send + Sync {
    async fn publish(&self, update: FreshnessOverview) -> DomainResult<()>;
}
