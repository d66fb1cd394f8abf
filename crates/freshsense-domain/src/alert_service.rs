use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::DomainResult;
use crate::repository::{
    AlertConfigStore, AlertRepository, NotificationDispatcher, RecipientDirectory,
};
use crate::types::{Alert, AlertConfig, CreateAlertInput, Unit, UpdateAlertConfigInput};

/// Domain service for freshness alerts: the per-unit cooldown gate plus
/// alert creation and dispatch.
///
/// The global configuration is fetched fresh on every decision; it is
/// administrator-mutable and must never be cached across readings.
pub struct AlertService {
    alert_repository: Arc<dyn AlertRepository>,
    config_store: Arc<dyn AlertConfigStore>,
    recipient_directory: Arc<dyn RecipientDirectory>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    dispatch_timeout: Duration,
}

impl AlertService {
    pub fn new(
        alert_repository: Arc<dyn AlertRepository>,
        config_store: Arc<dyn AlertConfigStore>,
        recipient_directory: Arc<dyn RecipientDirectory>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            alert_repository,
            config_store,
            recipient_directory,
            dispatcher,
            dispatch_timeout,
        }
    }

    pub async fn get_config(&self) -> DomainResult<AlertConfig> {
        self.config_store.get_global().await
    }

    /// Apply a partial update to the global alert configuration.
    pub async fn update_config(&self, input: UpdateAlertConfigInput) -> DomainResult<AlertConfig> {
        let config = self.config_store.update(input).await?;
        info!(
            freshness_threshold = config.freshness_threshold,
            cooldown_minutes = config.cooldown_minutes,
            "Updated alert config"
        );
        Ok(config)
    }

    /// Decide whether a new alert may fire for this unit and score.
    ///
    /// Read-only: creating the alert is a separate step. Two concurrent
    /// ingestions for the same unit can both pass this check and produce
    /// duplicate alerts; that race is tolerated rather than closed with a
    /// per-unit lock.
    pub async fn should_trigger(&self, unit_id: i64, freshness_score: i32) -> DomainResult<bool> {
        let config = self.config_store.get_global().await?;

        if freshness_score >= config.freshness_threshold {
            return Ok(false);
        }

        let cooldown_start = Utc::now() - ChronoDuration::minutes(config.cooldown_minutes.into());
        match self.alert_repository.most_recent_for_unit(unit_id).await? {
            Some(last_alert) => Ok(last_alert.created_at < cooldown_start),
            None => Ok(true),
        }
    }

    /// Create an alert for the unit, attempt dispatch, and persist the
    /// outcome. A failed or timed-out dispatch is recorded on the alert row
    /// and does not fail the call.
    pub async fn trigger_alert(
        &self,
        unit: &Unit,
        freshness_score: i32,
    ) -> DomainResult<Option<Alert>> {
        let config = self.config_store.get_global().await?;
        let recipients = self.recipient_directory.list_alert_recipients().await?;

        if recipients.is_empty() {
            warn!(unit_id = unit.id, "No alert recipients configured, skipping alert");
            return Ok(None);
        }

        let product_name = unit
            .product
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("Unknown");

        let message = format!(
            "FRESHNESS ALERT!\nUnit: {}\nProduct: {}\nFreshness: {}% (below {}% threshold)\nAction required",
            unit.name, product_name, freshness_score, config.freshness_threshold
        );

        let created_at = Utc::now();
        let mut input = CreateAlertInput {
            unit_id: unit.id,
            freshness_score,
            message: message.clone(),
            recipients: recipients.clone(),
            sent: false,
            error_message: None,
            created_at,
            sent_at: None,
        };

        match timeout(
            self.dispatch_timeout,
            self.dispatcher.send(recipients, message),
        )
        .await
        {
            Ok(Ok(())) => {
                input.sent = true;
                input.sent_at = Some(Utc::now());
                info!(
                    unit_id = unit.id,
                    freshness_score, "Alert notification sent"
                );
            }
            Ok(Err(e)) => {
                error!(unit_id = unit.id, error = %e, "Failed to send alert notification");
                input.error_message = Some(e.to_string());
            }
            Err(_) => {
                error!(
                    unit_id = unit.id,
                    timeout_ms = self.dispatch_timeout.as_millis() as u64,
                    "Alert notification dispatch timed out"
                );
                input.error_message = Some("notification dispatch timed out".to_string());
            }
        }

        let alert = self.alert_repository.save(input).await?;
        debug!(alert_id = alert.id, unit_id = unit.id, "Alert persisted");
        Ok(Some(alert))
    }

    /// Alerts raised in the last 24 hours, most recent first.
    pub async fn recent_alerts(&self) -> DomainResult<Vec<Alert>> {
        self.alert_repository
            .list_since(Utc::now() - ChronoDuration::hours(24))
            .await
    }

    pub async fn alerts_for_unit(&self, unit_id: i64) -> DomainResult<Vec<Alert>> {
        self.alert_repository.list_for_unit(unit_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{
        MockAlertConfigStore, MockAlertRepository, MockNotificationDispatcher,
        MockRecipientDirectory,
    };
    use crate::types::Product;

    fn service(
        alerts: MockAlertRepository,
        config: MockAlertConfigStore,
        recipients: MockRecipientDirectory,
        dispatcher: MockNotificationDispatcher,
    ) -> AlertService {
        AlertService::new(
            Arc::new(alerts),
            Arc::new(config),
            Arc::new(recipients),
            Arc::new(dispatcher),
            Duration::from_secs(5),
        )
    }

    fn default_config_store() -> MockAlertConfigStore {
        let mut config = MockAlertConfigStore::new();
        config
            .expect_get_global()
            .returning(|| Ok(AlertConfig::default()));
        config
    }

    fn test_unit() -> Unit {
        Unit {
            id: 7,
            name: "Banana Crate A".to_string(),
            inventory_count: 12,
            current_price: Some(8.99),
            product: Some(Product {
                id: 3,
                name: "Banana".to_string(),
                effective_base_price: 10.0,
            }),
        }
    }

    fn past_alert(minutes_ago: i64) -> Alert {
        Alert {
            id: 1,
            unit_id: 7,
            freshness_score: 42,
            message: "previous".to_string(),
            recipients: vec!["+15550001".to_string()],
            sent: true,
            error_message: None,
            created_at: Utc::now() - ChronoDuration::minutes(minutes_ago),
            sent_at: Some(Utc::now() - ChronoDuration::minutes(minutes_ago)),
        }
    }

    #[tokio::test]
    async fn test_should_trigger_with_no_prior_alert() {
        let mut alerts = MockAlertRepository::new();
        alerts
            .expect_most_recent_for_unit()
            .times(1)
            .return_once(|_| Ok(None));

        let service = service(
            alerts,
            default_config_store(),
            MockRecipientDirectory::new(),
            MockNotificationDispatcher::new(),
        );

        assert!(service.should_trigger(7, 42).await.unwrap());
    }

    #[tokio::test]
    async fn test_should_not_trigger_at_or_above_threshold() {
        // Score equal to the threshold never triggers; the comparison is
        // strictly below.
        let service = service(
            MockAlertRepository::new(),
            default_config_store(),
            MockRecipientDirectory::new(),
            MockNotificationDispatcher::new(),
        );

        assert!(!service.should_trigger(7, 60).await.unwrap());
        assert!(!service.should_trigger(7, 95).await.unwrap());
    }

    #[tokio::test]
    async fn test_should_not_trigger_inside_cooldown() {
        let mut alerts = MockAlertRepository::new();
        alerts
            .expect_most_recent_for_unit()
            .times(1)
            .return_once(|_| Ok(Some(past_alert(29))));

        let service = service(
            alerts,
            default_config_store(),
            MockRecipientDirectory::new(),
            MockNotificationDispatcher::new(),
        );

        assert!(!service.should_trigger(7, 42).await.unwrap());
    }

    #[tokio::test]
    async fn test_should_trigger_after_cooldown_expires() {
        let mut alerts = MockAlertRepository::new();
        alerts
            .expect_most_recent_for_unit()
            .times(1)
            .return_once(|_| Ok(Some(past_alert(31))));

        let service = service(
            alerts,
            default_config_store(),
            MockRecipientDirectory::new(),
            MockNotificationDispatcher::new(),
        );

        assert!(service.should_trigger(7, 42).await.unwrap());
    }

    #[tokio::test]
    async fn test_trigger_alert_records_successful_dispatch() {
        let mut alerts = MockAlertRepository::new();
        alerts
            .expect_save()
            .withf(|input: &CreateAlertInput| {
                input.sent
                    && input.sent_at.is_some()
                    && input.error_message.is_none()
                    && input.unit_id == 7
                    && input.message.contains("Banana")
                    && input.message.contains("42%")
            })
            .times(1)
            .return_once(|input| {
                Ok(Alert {
                    id: 99,
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

        let mut recipients = MockRecipientDirectory::new();
        recipients
            .expect_list_alert_recipients()
            .times(1)
            .return_once(|| Ok(vec!["+15550001".to_string()]));

        let mut dispatcher = MockNotificationDispatcher::new();
        dispatcher
            .expect_send()
            .withf(|recipients: &Vec<String>, message: &String| {
                recipients.len() == 1 && message.contains("FRESHNESS ALERT")
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let service = service(alerts, default_config_store(), recipients, dispatcher);

        let alert = service.trigger_alert(&test_unit(), 42).await.unwrap();
        assert!(alert.is_some());
        assert!(alert.unwrap().sent);
    }

    #[tokio::test]
    async fn test_trigger_alert_records_dispatch_failure() {
        let mut alerts = MockAlertRepository::new();
        alerts
            .expect_save()
            .withf(|input: &CreateAlertInput| {
                !input.sent && input.sent_at.is_none() && input.error_message.is_some()
            })
            .times(1)
            .return_once(|input| {
                Ok(Alert {
                    id: 100,
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

        let mut recipients = MockRecipientDirectory::new();
        recipients
            .expect_list_alert_recipients()
            .times(1)
            .return_once(|| Ok(vec!["+15550001".to_string()]));

        let mut dispatcher = MockNotificationDispatcher::new();
        dispatcher.expect_send().times(1).return_once(|_, _| {
            Err(crate::error::DomainError::RepositoryError(anyhow::anyhow!(
                "SMS gateway unreachable"
            )))
        });

        let service = service(alerts, default_config_store(), recipients, dispatcher);

        // Dispatch failure is recorded, not propagated
        let alert = service.trigger_alert(&test_unit(), 42).await.unwrap();
        let alert = alert.unwrap();
        assert!(!alert.sent);
        assert!(alert.error_message.is_some());
    }

    #[tokio::test]
    async fn test_trigger_alert_skips_without_recipients() {
        let mut recipients = MockRecipientDirectory::new();
        recipients
            .expect_list_alert_recipients()
            .times(1)
            .return_once(|| Ok(vec![]));

        // No save expected: no alert row without recipients
        let service = service(
            MockAlertRepository::new(),
            default_config_store(),
            recipients,
            MockNotificationDispatcher::new(),
        );

        let alert = service.trigger_alert(&test_unit(), 42).await.unwrap();
        assert!(alert.is_none());
    }

    #[tokio::test]
    async fn test_update_config_partial() {
        let mut config = MockAlertConfigStore::new();
        config
            .expect_update()
            .withf(|input: &UpdateAlertConfigInput| {
                input.freshness_threshold == Some(70) && input.cooldown_minutes.is_none()
            })
            .times(1)
            .return_once(|_| {
                Ok(AlertConfig {
                    freshness_threshold: 70,
                    cooldown_minutes: 30,
                })
            });

        let service = service(
            MockAlertRepository::new(),
            config,
            MockRecipientDirectory::new(),
            MockNotificationDispatcher::new(),
        );

        let updated = service
            .update_config(UpdateAlertConfigInput {
                freshness_threshold: Some(70),
                cooldown_minutes: None,
            })
            .await
            .unwrap();
        assert_eq!(updated.freshness_threshold, 70);
    }
}
