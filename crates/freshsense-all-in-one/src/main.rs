mod config;
mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use freshsense_domain::{AlertService, IngestionService};
use freshsense_mqtt::{run_mqtt_subscriber, MqttSubscriberConfig};
use freshsense_nats::{FreshnessUpdateProducer, NatsClient};
use freshsense_postgres::{
    PostgresAlertConfigStore, PostgresAlertRepository, PostgresClient, PostgresConfig,
    PostgresDeviceRepository, PostgresReadingRepository, PostgresRecipientDirectory,
    PostgresUnitRepository,
};
use freshsense_sms::{TextBeeConfig, TextBeeDispatcher};

use config::ServiceConfig;
use telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig, TelemetryProviders};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        "Starting freshsense-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    let ingestion_service = match initialize_services(&config).await {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to initialize services: {}", e);
            shutdown_telemetry(telemetry_providers);
            std::process::exit(1);
        }
    };

    let shutdown_token = CancellationToken::new();

    let subscriber_config = MqttSubscriberConfig {
        broker_url: config.mqtt_broker_url.clone(),
        client_id: config.mqtt_client_id.clone(),
        topic: config.mqtt_topic.clone(),
        max_retry_attempts: config.mqtt_max_retry_attempts,
        retry_delay_secs: config.mqtt_retry_delay_secs,
    };
    let subscriber_handle = tokio::spawn(run_mqtt_subscriber(
        subscriber_config,
        shutdown_token.clone(),
        ingestion_service,
    ));

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    shutdown_token.cancel();
    if let Err(e) = subscriber_handle.await {
        error!("MQTT subscriber task panicked: {}", e);
    }

    info!("Shutdown complete");
    shutdown_telemetry(telemetry_providers);
}

/// Wire repositories, external collaborators, and the domain services.
async fn initialize_services(config: &ServiceConfig) -> anyhow::Result<Arc<IngestionService>> {
    let postgres_client = PostgresClient::new(&PostgresConfig {
        host: config.postgres_host.clone(),
        port: config.postgres_port,
        database: config.postgres_database.clone(),
        username: config.postgres_username.clone(),
        password: config.postgres_password.clone(),
        max_pool_size: config.postgres_max_pool_size,
    })?;
    postgres_client.ping().await?;
    info!("Connected to PostgreSQL");

    let nats_client = NatsClient::connect(
        &config.nats_url,
        Duration::from_secs(config.nats_connect_timeout_secs),
    )
    .await?;

    let update_producer = Arc::new(FreshnessUpdateProducer::new(
        nats_client.client(),
        config.nats_update_subject.clone(),
    ));

    let dispatcher = Arc::new(TextBeeDispatcher::new(TextBeeConfig {
        api_url: config.sms_api_url.clone(),
        gateway_device_id: config.sms_gateway_device_id.clone(),
        api_key: config.sms_api_key.clone(),
    }));

    let alert_service = Arc::new(AlertService::new(
        Arc::new(PostgresAlertRepository::new(postgres_client.clone())),
        Arc::new(PostgresAlertConfigStore::new(postgres_client.clone())),
        Arc::new(PostgresRecipientDirectory::new(postgres_client.clone())),
        dispatcher,
        Duration::from_secs(config.alert_dispatch_timeout_secs),
    ));

    Ok(Arc::new(IngestionService::new(
        Arc::new(PostgresUnitRepository::new(postgres_client.clone())),
        Arc::new(PostgresDeviceRepository::new(postgres_client.clone())),
        Arc::new(PostgresReadingRepository::new(postgres_client)),
        alert_service,
        update_producer,
        Duration::from_secs(config.update_publish_timeout_secs),
    )))
}
