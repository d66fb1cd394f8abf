pub mod alert_service;
pub mod error;
pub mod ingestion_service;
pub mod pricing;
pub mod repository;
pub mod score;
pub mod types;
pub mod validate;

pub use alert_service::AlertService;
pub use error::{DomainError, DomainResult};
pub use ingestion_service::IngestionService;
pub use pricing::{discount_percentage, dynamic_price, FreshnessStatus};
pub use repository::{
    AlertConfigStore, AlertRepository, DeviceRepository, FreshnessUpdatePublisher,
    NotificationDispatcher, ReadingRepository, RecipientDirectory, UnitRepository,
};
pub use score::freshness_score;
pub use types::*;
