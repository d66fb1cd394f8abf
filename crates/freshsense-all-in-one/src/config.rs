use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // Telemetry configuration
    /// Service name reported to the telemetry backend
    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,

    /// OTLP endpoint for traces and logs
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    /// Enable OpenTelemetry export
    #[serde(default = "default_otel_enabled")]
    pub otel_enabled: bool,

    // PostgreSQL configuration
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    #[serde(default = "default_postgres_max_pool_size")]
    pub postgres_max_pool_size: usize,

    // NATS configuration
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Base subject for live freshness updates; unit id is appended
    #[serde(default = "default_nats_update_subject")]
    pub nats_update_subject: String,

    /// NATS connection timeout in seconds
    #[serde(default = "default_nats_connect_timeout_secs")]
    pub nats_connect_timeout_secs: u64,

    // MQTT configuration
    /// MQTT broker URL (host:port, mqtt:// prefix accepted)
    #[serde(default = "default_mqtt_broker_url")]
    pub mqtt_broker_url: String,

    /// MQTT client id
    #[serde(default = "default_mqtt_client_id")]
    pub mqtt_client_id: String,

    /// Base MQTT topic for sensor payloads; subscribed as `{topic}/#`
    #[serde(default = "default_mqtt_topic")]
    pub mqtt_topic: String,

    /// Maximum MQTT reconnect attempts before giving up
    #[serde(default = "default_mqtt_max_retry_attempts")]
    pub mqtt_max_retry_attempts: u32,

    /// Delay between MQTT reconnect attempts in seconds
    #[serde(default = "default_mqtt_retry_delay_secs")]
    pub mqtt_retry_delay_secs: u64,

    // SMS gateway configuration
    #[serde(default = "default_sms_api_url")]
    pub sms_api_url: String,

    #[serde(default = "default_sms_gateway_device_id")]
    pub sms_gateway_device_id: String,

    #[serde(default = "default_sms_api_key")]
    pub sms_api_key: String,

    // Side-effect timeouts
    /// Upper bound for one alert notification dispatch in seconds
    #[serde(default = "default_alert_dispatch_timeout_secs")]
    pub alert_dispatch_timeout_secs: u64,

    /// Upper bound for one live-update publish in seconds
    #[serde(default = "default_update_publish_timeout_secs")]
    pub update_publish_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_otel_service_name() -> String {
    "freshsense-all-in-one".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_enabled() -> bool {
    false
}

fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "freshsense".to_string()
}

fn default_postgres_username() -> String {
    "freshsense".to_string()
}

fn default_postgres_password() -> String {
    "freshsense".to_string()
}

fn default_postgres_max_pool_size() -> usize {
    10
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_nats_update_subject() -> String {
    "freshness.updates".to_string()
}

fn default_nats_connect_timeout_secs() -> u64 {
    10
}

fn default_mqtt_broker_url() -> String {
    "mqtt://localhost:1883".to_string()
}

fn default_mqtt_client_id() -> String {
    "freshsense-ingest".to_string()
}

fn default_mqtt_topic() -> String {
    "sensors/freshness".to_string()
}

fn default_mqtt_max_retry_attempts() -> u32 {
    10
}

fn default_mqtt_retry_delay_secs() -> u64 {
    5
}

fn default_sms_api_url() -> String {
    "https://api.textbee.dev/api/v1/gateway/devices".to_string()
}

fn default_sms_gateway_device_id() -> String {
    String::new()
}

fn default_sms_api_key() -> String {
    String::new()
}

fn default_alert_dispatch_timeout_secs() -> u64 {
    10
}

fn default_update_publish_timeout_secs() -> u64 {
    5
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("FRESHSENSE"))
            .build()?
            .try_deserialize()
    }
}
