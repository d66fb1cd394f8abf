use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::alert_service::AlertService;
use crate::error::{DomainError, DomainResult};
use crate::pricing::{self, FreshnessStatus};
use crate::repository::{
    DeviceRepository, FreshnessUpdatePublisher, ReadingRepository, UnitRepository,
};
use crate::score;
use crate::types::{
    CreateReadingInput, Device, FreshnessOverview, IngestReadingInput, Reading,
    RegisterDeviceInput, Unit,
};
use crate::validate::validate_struct;

/// Orchestrates one ingested sensor event end to end.
///
/// Flow:
/// 1. Validate the raw input
/// 2. Resolve or auto-register the device, touch last-seen
/// 3. Resolve the unit (hard failure when unknown)
/// 4. Compute freshness score and dynamic price
/// 5. Persist the reading together with the unit's new price
/// 6. Evaluate the alert gate, best-effort
/// 7. Broadcast the live update, best-effort
pub struct IngestionService {
    unit_repository: Arc<dyn UnitRepository>,
    device_repository: Arc<dyn DeviceRepository>,
    reading_repository: Arc<dyn ReadingRepository>,
    alert_service: Arc<AlertService>,
    update_publisher: Arc<dyn FreshnessUpdatePublisher>,
    publish_timeout: Duration,
}

impl IngestionService {
    pub fn new(
        unit_repository: Arc<dyn UnitRepository>,
        device_repository: Arc<dyn DeviceRepository>,
        reading_repository: Arc<dyn ReadingRepository>,
        alert_service: Arc<AlertService>,
        update_publisher: Arc<dyn FreshnessUpdatePublisher>,
        publish_timeout: Duration,
    ) -> Self {
        Self {
            unit_repository,
            device_repository,
            reading_repository,
            alert_service,
            update_publisher,
            publish_timeout,
        }
    }

    /// Process one sensor event into a persisted reading, an updated unit
    /// price, and best-effort alert and broadcast side effects.
    ///
    /// Failures before and including persistence propagate to the caller;
    /// alerting and broadcasting are logged on failure and never abort the
    /// call or roll anything back.
    pub async fn ingest(&self, input: IngestReadingInput) -> DomainResult<Reading> {
        validate_struct(&input)?;

        debug!(
            unit_id = input.unit_id,
            device_id = %input.device_id,
            voc = input.voc,
            temperature = input.temperature,
            humidity = input.humidity,
            "Ingesting sensor reading"
        );

        let device = self.resolve_device(&input.device_id).await?;
        self.device_repository
            .touch_last_seen(&input.device_id)
            .await?;

        let unit = self
            .unit_repository
            .get_unit(input.unit_id)
            .await?
            .ok_or(DomainError::UnitNotFound(input.unit_id))?;

        let freshness_score = score::freshness_score(input.voc, input.temperature, input.humidity);
        let base_price = unit
            .product
            .as_ref()
            .map(|p| p.effective_base_price)
            .unwrap_or(0.0);
        let computed_price = pricing::dynamic_price(base_price, freshness_score);

        let reading = self
            .reading_repository
            .record(CreateReadingInput {
                unit_id: unit.id,
                device_id: device.id,
                voc: input.voc,
                temperature: input.temperature,
                humidity: input.humidity,
                freshness_score,
                computed_price,
                timestamp: input.timestamp.unwrap_or_else(Utc::now),
            })
            .await?;

        self.evaluate_alert(&unit, freshness_score).await;
        self.broadcast_update(&unit, &reading).await;

        info!(
            unit_id = unit.id,
            device_id = %input.device_id,
            freshness_score,
            computed_price,
            "Processed sensor reading"
        );

        Ok(reading)
    }

    /// Unknown external device ids are auto-registered with placeholder
    /// name and location rather than rejected.
    async fn resolve_device(&self, device_id: &str) -> DomainResult<Device> {
        if let Some(device) = self.device_repository.find_by_device_id(device_id).await? {
            return Ok(device);
        }

        info!(device_id = %device_id, "Auto-registering unknown device");
        self.device_repository
            .register(RegisterDeviceInput {
                device_id: device_id.to_string(),
                name: None,
                location: None,
            })
            .await
    }

    async fn evaluate_alert(&self, unit: &Unit, freshness_score: i32) {
        match self.alert_service.should_trigger(unit.id, freshness_score).await {
            Ok(true) => {
                if let Err(e) = self.alert_service.trigger_alert(unit, freshness_score).await {
                    warn!(unit_id = unit.id, error = %e, "Failed to create alert");
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!(unit_id = unit.id, error = %e, "Alert evaluation failed");
            }
        }
    }

    async fn broadcast_update(&self, unit: &Unit, reading: &Reading) {
        let update = overview_from_reading(unit, reading);

        match timeout(self.publish_timeout, self.update_publisher.publish(update)).await {
            Ok(Ok(())) => {
                debug!(unit_id = unit.id, "Broadcast freshness update");
            }
            Ok(Err(e)) => {
                warn!(unit_id = unit.id, error = %e, "Failed to broadcast freshness update");
            }
            Err(_) => {
                warn!(
                    unit_id = unit.id,
                    timeout_ms = self.publish_timeout.as_millis() as u64,
                    "Freshness update broadcast timed out"
                );
            }
        }
    }

    /// Freshness overview for a unit: unit state plus the latest reading
    /// with its status label and discount, when one exists.
    pub async fn overview(&self, unit_id: i64) -> DomainResult<FreshnessOverview> {
        let unit = self
            .unit_repository
            .get_unit(unit_id)
            .await?
            .ok_or(DomainError::UnitNotFound(unit_id))?;

        let latest = self.reading_repository.latest_for_unit(unit_id).await?;

        let mut overview = FreshnessOverview {
            unit_id: unit.id,
            unit_name: unit.name.clone(),
            product_name: unit
                .product
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            inventory_count: unit.inventory_count,
            current_price: unit.current_price,
            latest_freshness_score: None,
            voc: None,
            temperature: None,
            humidity: None,
            latest_reading_timestamp: None,
            freshness_status: None,
            discount_percentage: None,
        };

        if let Some(reading) = latest {
            overview.latest_freshness_score = Some(reading.freshness_score);
            overview.voc = Some(reading.voc);
            overview.temperature = Some(reading.temperature);
            overview.humidity = Some(reading.humidity);
            overview.latest_reading_timestamp = Some(reading.timestamp);
            overview.freshness_status = Some(FreshnessStatus::from_score(reading.freshness_score));
            overview.discount_percentage = Some(pricing::discount_percentage(reading.freshness_score));
        }

        Ok(overview)
    }

    /// Most recent readings for a unit, newest first.
    pub async fn recent_readings(&self, unit_id: i64, limit: i64) -> DomainResult<Vec<Reading>> {
        self.require_unit(unit_id).await?;
        self.reading_repository.list_recent(unit_id, limit).await
    }

    /// Readings for a unit within a time range, newest first.
    pub async fn readings_in_range(
        &self,
        unit_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<Reading>> {
        self.require_unit(unit_id).await?;
        self.reading_repository.list_range(unit_id, start, end).await
    }

    pub async fn latest_reading(&self, unit_id: i64) -> DomainResult<Reading> {
        self.reading_repository
            .latest_for_unit(unit_id)
            .await?
            .ok_or(DomainError::NoReadingsForUnit(unit_id))
    }

    async fn require_unit(&self, unit_id: i64) -> DomainResult<()> {
        self.unit_repository
            .get_unit(unit_id)
            .await?
            .ok_or(DomainError::UnitNotFound(unit_id))?;
        Ok(())
    }
}

/// Build the live-update payload from a freshly persisted reading. The
/// unit's stored price was just overwritten with the reading's price.
fn overview_from_reading(unit: &Unit, reading: &Reading) -> FreshnessOverview {
    FreshnessOverview {
        unit_id: unit.id,
        unit_name: unit.name.clone(),
        product_name: unit
            .product
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        inventory_count: unit.inventory_count,
        current_price: Some(reading.computed_price),
        latest_freshness_score: Some(reading.freshness_score),
        voc: Some(reading.voc),
        temperature: Some(reading.temperature),
        humidity: Some(reading.humidity),
        latest_reading_timestamp: Some(reading.timestamp),
        freshness_status: Some(FreshnessStatus::from_score(reading.freshness_score)),
        discount_percentage: Some(pricing::discount_percentage(reading.freshness_score)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{
        MockAlertConfigStore, MockAlertRepository, MockDeviceRepository,
        MockFreshnessUpdatePublisher, MockNotificationDispatcher, MockReadingRepository,
        MockRecipientDirectory, MockUnitRepository,
    };
    use crate::types::{Alert, AlertConfig, Product};

    fn test_unit() -> Unit {
        Unit {
            id: 1,
            name: "Banana Crate A".to_string(),
            inventory_count: 12,
            current_price: Some(9.00),
            product: Some(Product {
                id: 3,
                name: "Banana".to_string(),
                effective_base_price: 10.0,
            }),
        }
    }

    fn test_device() -> Device {
        Device {
            id: 5,
            device_id: "D1".to_string(),
            name: "D1".to_string(),
            location: "Unknown".to_string(),
            last_seen: Some(Utc::now()),
        }
    }

    fn test_input() -> IngestReadingInput {
        IngestReadingInput {
            unit_id: 1,
            device_id: "D1".to_string(),
            voc: 40.0,
            temperature: 7.0,
            humidity: 90.0,
            timestamp: None,
        }
    }

    fn reading_from(input: &CreateReadingInput) -> Reading {
        Reading {
            id: 77,
            unit_id: input.unit_id,
            device_id: input.device_id,
            voc: input.voc,
            temperature: input.temperature,
            humidity: input.humidity,
            freshness_score: input.freshness_score,
            computed_price: input.computed_price,
            timestamp: input.timestamp,
        }
    }

    struct Mocks {
        units: MockUnitRepository,
        devices: MockDeviceRepository,
        readings: MockReadingRepository,
        alerts: MockAlertRepository,
        config: MockAlertConfigStore,
        recipients: MockRecipientDirectory,
        dispatcher: MockNotificationDispatcher,
        publisher: MockFreshnessUpdatePublisher,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                units: MockUnitRepository::new(),
                devices: MockDeviceRepository::new(),
                readings: MockReadingRepository::new(),
                alerts: MockAlertRepository::new(),
                config: MockAlertConfigStore::new(),
                recipients: MockRecipientDirectory::new(),
                dispatcher: MockNotificationDispatcher::new(),
                publisher: MockFreshnessUpdatePublisher::new(),
            }
        }

        fn into_service(self) -> IngestionService {
            let alert_service = Arc::new(AlertService::new(
                Arc::new(self.alerts),
                Arc::new(self.config),
                Arc::new(self.recipients),
                Arc::new(self.dispatcher),
                Duration::from_secs(5),
            ));
            IngestionService::new(
                Arc::new(self.units),
                Arc::new(self.devices),
                Arc::new(self.readings),
                alert_service,
                Arc::new(self.publisher),
                Duration::from_secs(5),
            )
        }
    }

    fn expect_known_device(mocks: &mut Mocks) {
        mocks
            .devices
            .expect_find_by_device_id()
            .times(1)
            .return_once(|_| Ok(Some(test_device())));
        mocks
            .devices
            .expect_touch_last_seen()
            .times(1)
            .return_once(|_| Ok(()));
    }

    #[tokio::test]
    async fn test_ingest_happy_path() {
        let mut mocks = Mocks::new();
        expect_known_device(&mut mocks);

        mocks
            .units
            .expect_get_unit()
            .withf(|unit_id| *unit_id == 1)
            .times(1)
            .return_once(|_| Ok(Some(test_unit())));

        mocks
            .readings
            .expect_record()
            .withf(|input: &CreateReadingInput| {
                input.unit_id == 1
                    && input.device_id == 5
                    && input.freshness_score == 100
                    && input.computed_price == 10.00
            })
            .times(1)
            .return_once(|input| Ok(reading_from(&input)));

        // Score 100 sits above the default threshold: no alert, so only the
        // gate's config fetch runs.
        mocks
            .config
            .expect_get_global()
            .times(1)
            .return_once(|| Ok(AlertConfig::default()));

        mocks
            .publisher
            .expect_publish()
            .withf(|update: &FreshnessOverview| {
                update.unit_id == 1
                    && update.latest_freshness_score == Some(100)
                    && update.current_price == Some(10.00)
                    && update.freshness_status == Some(FreshnessStatus::Fresh)
                    && update.discount_percentage == Some(0)
            })
            .times(1)
            .return_once(|_| Ok(()));

        let service = mocks.into_service();
        let reading = service.ingest(test_input()).await.unwrap();

        assert_eq!(reading.freshness_score, 100);
        assert_eq!(reading.computed_price, 10.00);
    }

    #[tokio::test]
    async fn test_ingest_unknown_unit_fails_before_side_effects() {
        let mut mocks = Mocks::new();
        expect_known_device(&mut mocks);

        mocks
            .units
            .expect_get_unit()
            .times(1)
            .return_once(|_| Ok(None));

        // No record, no alert, no broadcast expected
        let service = mocks.into_service();
        let result = service.ingest(test_input()).await;

        assert!(matches!(result, Err(DomainError::UnitNotFound(1))));
    }

    #[tokio::test]
    async fn test_ingest_rejects_invalid_input_before_any_lookup() {
        let mocks = Mocks::new();
        let service = mocks.into_service();

        let mut input = test_input();
        input.voc = f64::NAN;

        let result = service.ingest(input).await;
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_ingest_auto_registers_unknown_device() {
        let mut mocks = Mocks::new();

        mocks
            .devices
            .expect_find_by_device_id()
            .times(1)
            .return_once(|_| Ok(None));
        mocks
            .devices
            .expect_register()
            .withf(|input: &RegisterDeviceInput| {
                input.device_id == "D1" && input.name.is_none() && input.location.is_none()
            })
            .times(1)
            .return_once(|_| Ok(test_device()));
        mocks
            .devices
            .expect_touch_last_seen()
            .times(1)
            .return_once(|_| Ok(()));

        mocks
            .units
            .expect_get_unit()
            .times(1)
            .return_once(|_| Ok(Some(test_unit())));
        mocks
            .readings
            .expect_record()
            .times(1)
            .return_once(|input| Ok(reading_from(&input)));
        mocks
            .config
            .expect_get_global()
            .times(1)
            .return_once(|| Ok(AlertConfig::default()));
        mocks
            .publisher
            .expect_publish()
            .times(1)
            .return_once(|_| Ok(()));

        let service = mocks.into_service();
        assert!(service.ingest(test_input()).await.is_ok());
    }

    #[tokio::test]
    async fn test_ingest_low_score_triggers_alert() {
        let mut mocks = Mocks::new();
        expect_known_device(&mut mocks);

        mocks
            .units
            .expect_get_unit()
            .times(1)
            .return_once(|_| Ok(Some(test_unit())));

        // voc=450, temp=25, humidity=50 -> sub-scores 17.5 / 36.6 / 45
        // weighted = 10.5 + 9.166 + 6.75 = 26.4 -> 26, below threshold 60
        let mut input = test_input();
        input.voc = 450.0;
        input.temperature = 25.0;
        input.humidity = 50.0;

        mocks
            .readings
            .expect_record()
            .withf(|input: &CreateReadingInput| input.freshness_score < 60)
            .times(1)
            .return_once(|input| Ok(reading_from(&input)));

        // Gate fetch + trigger fetch, both fresh
        mocks
            .config
            .expect_get_global()
            .times(2)
            .returning(|| Ok(AlertConfig::default()));
        mocks
            .alerts
            .expect_most_recent_for_unit()
            .times(1)
            .return_once(|_| Ok(None));
        mocks
            .recipients
            .expect_list_alert_recipients()
            .times(1)
            .return_once(|| Ok(vec!["+15550001".to_string()]));
        mocks
            .dispatcher
            .expect_send()
            .times(1)
            .return_once(|_, _| Ok(()));
        mocks.alerts.expect_save().times(1).return_once(|input| {
            Ok(Alert {
                id: 1,
                unit_id: input.unit_id,
                freshness_score: input.freshness_score,
                message: input.message,
                recipients: input.recipients,
                sent: input.sent,
                error_message: input.error_message,
                created_at: input.created_at,
                sent_at: input.sent_at,
            })
        });

        mocks
            .publisher
            .expect_publish()
            .times(1)
            .return_once(|_| Ok(()));

        let service = mocks.into_service();
        let reading = service.ingest(input).await.unwrap();
        assert!(reading.freshness_score < 60);
    }

    #[tokio::test]
    async fn test_ingest_survives_alert_and_broadcast_failures() {
        let mut mocks = Mocks::new();
        expect_known_device(&mut mocks);

        mocks
            .units
            .expect_get_unit()
            .times(1)
            .return_once(|_| Ok(Some(test_unit())));
        mocks
            .readings
            .expect_record()
            .times(1)
            .return_once(|input| Ok(reading_from(&input)));

        // Alert gate blows up; ingest must not care
        mocks.config.expect_get_global().times(1).return_once(|| {
            Err(DomainError::RepositoryError(anyhow::anyhow!(
                "config table unavailable"
            )))
        });

        // Broadcast blows up too
        mocks.publisher.expect_publish().times(1).return_once(|_| {
            Err(DomainError::RepositoryError(anyhow::anyhow!(
                "NATS publish failed"
            )))
        });

        let mut input = test_input();
        input.voc = 450.0;

        let service = mocks.into_service();
        assert!(service.ingest(input).await.is_ok());
    }

    #[tokio::test]
    async fn test_ingest_uses_zero_base_price_without_product() {
        let mut mocks = Mocks::new();
        expect_known_device(&mut mocks);

        let mut unit = test_unit();
        unit.product = None;
        mocks
            .units
            .expect_get_unit()
            .times(1)
            .return_once(move |_| Ok(Some(unit)));

        mocks
            .readings
            .expect_record()
            .withf(|input: &CreateReadingInput| input.computed_price == 0.0)
            .times(1)
            .return_once(|input| Ok(reading_from(&input)));
        mocks
            .config
            .expect_get_global()
            .times(1)
            .return_once(|| Ok(AlertConfig::default()));
        mocks
            .publisher
            .expect_publish()
            .times(1)
            .return_once(|_| Ok(()));

        let service = mocks.into_service();
        let reading = service.ingest(test_input()).await.unwrap();
        assert_eq!(reading.computed_price, 0.0);
    }

    #[tokio::test]
    async fn test_overview_with_latest_reading() {
        let mut mocks = Mocks::new();
        mocks
            .units
            .expect_get_unit()
            .times(1)
            .return_once(|_| Ok(Some(test_unit())));
        mocks
            .readings
            .expect_latest_for_unit()
            .times(1)
            .return_once(|_| {
                Ok(Some(Reading {
                    id: 9,
                    unit_id: 1,
                    device_id: 5,
                    voc: 200.0,
                    temperature: 12.0,
                    humidity: 70.0,
                    freshness_score: 65,
                    computed_price: 9.00,
                    timestamp: Utc::now(),
                }))
            });

        let service = mocks.into_service();
        let overview = service.overview(1).await.unwrap();

        assert_eq!(overview.unit_name, "Banana Crate A");
        assert_eq!(overview.product_name, "Banana");
        assert_eq!(overview.latest_freshness_score, Some(65));
        assert_eq!(overview.freshness_status, Some(FreshnessStatus::Good));
        assert_eq!(overview.discount_percentage, Some(10));
    }

    #[tokio::test]
    async fn test_overview_without_readings() {
        let mut mocks = Mocks::new();
        mocks
            .units
            .expect_get_unit()
            .times(1)
            .return_once(|_| Ok(Some(test_unit())));
        mocks
            .readings
            .expect_latest_for_unit()
            .times(1)
            .return_once(|_| Ok(None));

        let service = mocks.into_service();
        let overview = service.overview(1).await.unwrap();

        assert_eq!(overview.latest_freshness_score, None);
        assert_eq!(overview.freshness_status, None);
    }

    #[tokio::test]
    async fn test_latest_reading_not_found() {
        let mut mocks = Mocks::new();
        mocks
            .readings
            .expect_latest_for_unit()
            .times(1)
            .return_once(|_| Ok(None));

        let service = mocks.into_service();
        let result = service.latest_reading(4).await;
        assert!(matches!(result, Err(DomainError::NoReadingsForUnit(4))));
    }

    #[tokio::test]
    async fn test_recent_readings_requires_known_unit() {
        let mut mocks = Mocks::new();
        mocks
            .units
            .expect_get_unit()
            .times(1)
            .return_once(|_| Ok(None));

        let service = mocks.into_service();
        let result = service.recent_readings(2, 50).await;
        assert!(matches!(result, Err(DomainError::UnitNotFound(2))));
    }
}
