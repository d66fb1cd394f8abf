mod client;
mod update_producer;

pub use client::NatsClient;
pub use update_producer::FreshnessUpdateProducer;
