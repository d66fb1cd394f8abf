mod alert_config_store;
mod alert_repository;
mod client;
mod config;
mod device_repository;
mod models;
mod reading_repository;
mod recipient_directory;
mod unit_repository;

pub use alert_config_store::PostgresAlertConfigStore;
pub use alert_repository::PostgresAlertRepository;
pub use client::PostgresClient;
pub use config::PostgresConfig;
pub use device_repository::PostgresDeviceRepository;
pub use reading_repository::PostgresReadingRepository;
pub use recipient_directory::PostgresRecipientDirectory;
pub use unit_repository::PostgresUnitRepository;
