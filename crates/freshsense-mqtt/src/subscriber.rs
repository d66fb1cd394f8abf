use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use freshsense_domain::{DomainError, DomainResult, IngestionService};

use crate::payload::SensorPayload;

/// Configuration for the MQTT ingestion subscriber
#[derive(Debug, Clone)]
pub struct MqttSubscriberConfig {
    pub broker_url: String,
    pub client_id: String,
    /// Base topic; the subscriber listens on `{topic}/#`
    pub topic: String,
    pub max_retry_attempts: u32,
    pub retry_delay_secs: u64,
}

impl MqttSubscriberConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Run the MQTT ingestion subscriber until cancelled.
///
/// Subscribes to `{topic}/#` and feeds every received sensor payload into
/// the ingestion service. Per-message failures (bad payload, unknown unit)
/// are logged and skipped; connection failures are retried with a bounded
/// attempt count.
#[instrument(name = "mqtt_subscriber", skip_all, fields(broker_url = %config.broker_url))]
pub async fn run_mqtt_subscriber(
    config: MqttSubscriberConfig,
    shutdown_token: CancellationToken,
    ingestion_service: Arc<IngestionService>,
) {
    info!(
        broker_url = %config.broker_url,
        topic = %config.topic,
        "starting MQTT subscriber"
    );

    let mut retry_count = 0;

    loop {
        if shutdown_token.is_cancelled() {
            debug!("MQTT subscriber cancelled before connection");
            break;
        }

        match run_mqtt_connection(&config, &shutdown_token, Arc::clone(&ingestion_service)).await
        {
            Ok(()) => {
                debug!("MQTT subscriber stopped cleanly");
                break;
            }
            Err(e) => {
                error!(error = %e, "MQTT connection error");

                retry_count += 1;
                if retry_count >= config.max_retry_attempts {
                    error!(
                        max_retries = config.max_retry_attempts,
                        "max retry attempts reached, stopping MQTT subscriber"
                    );
                    break;
                }

                warn!(
                    attempt = retry_count,
                    max_attempts = config.max_retry_attempts,
                    "retrying MQTT connection"
                );

                tokio::select! {
                    _ = shutdown_token.cancelled() => break,
                    _ = tokio::time::sleep(config.retry_delay()) => {}
                }
            }
        }
    }

    info!("MQTT subscriber stopped");
}

/// Run a single MQTT connection session
async fn run_mqtt_connection(
    config: &MqttSubscriberConfig,
    shutdown_token: &CancellationToken,
    ingestion_service: Arc<IngestionService>,
) -> DomainResult<()> {
    let (host, port) = parse_broker_url(&config.broker_url)?;

    let mut mqtt_options = MqttOptions::new(&config.client_id, host, port);
    mqtt_options.set_keep_alive(Duration::from_secs(30));
    mqtt_options.set_clean_session(true);

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);

    let subscribe_topic = format!("{}/#", config.topic);
    client
        .subscribe(&subscribe_topic, QoS::AtLeastOnce)
        .await
        .map_err(|e| DomainError::RepositoryError(anyhow::anyhow!("Failed to subscribe: {}", e)))?;

    info!(topic = %subscribe_topic, "subscribed to MQTT topic");

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                debug!("MQTT connection cancelled");
                let _ = client.disconnect().await;
                return Ok(());
            }
            event = eventloop.poll() => {
                match event {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        handle_message(&publish.topic, &publish.payload, &ingestion_service).await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        return Err(DomainError::RepositoryError(anyhow::anyhow!(
                            "MQTT event loop error: {}", e
                        )));
                    }
                }
            }
        }
    }
}

/// Parse and ingest one published message. Failures never tear down the
/// connection; the next message may well be fine.
async fn handle_message(
    topic: &str,
    payload: &[u8],
    ingestion_service: &Arc<IngestionService>,
) {
    debug!(topic = %topic, size_bytes = payload.len(), "MQTT message received");

    let payload = match SensorPayload::parse(payload) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(topic = %topic, error = %e, "Rejected malformed sensor payload");
            return;
        }
    };

    let device_id = payload.device_id.clone();
    let unit_id = payload.unit_id;

    match ingestion_service.ingest(payload.into()).await {
        Ok(reading) => {
            info!(
                device_id = %device_id,
                unit_id,
                freshness_score = reading.freshness_score,
                computed_price = reading.computed_price,
                "Processed MQTT sensor reading"
            );
        }
        Err(e) => {
            error!(
                device_id = %device_id,
                unit_id,
                error = %e,
                "Failed to process MQTT sensor reading"
            );
        }
    }
}

/// Accepts `host:port`, `mqtt://host:port`, or `tcp://host:port`; a missing
/// port defaults to 1883.
fn parse_broker_url(broker_url: &str) -> DomainResult<(String, u16)> {
    let stripped = broker_url
        .strip_prefix("mqtt://")
        .or_else(|| broker_url.strip_prefix("tcp://"))
        .unwrap_or(broker_url);

    if stripped.is_empty() {
        return Err(DomainError::ValidationError(format!(
            "invalid MQTT broker URL: {}",
            broker_url
        )));
    }

    match stripped.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| {
                DomainError::ValidationError(format!("invalid MQTT broker port in: {}", broker_url))
            })?;
            Ok((host.to_string(), port))
        }
        None => Ok((stripped.to_string(), 1883)),
    }
}
