mod payload;
mod subscriber;

pub use payload::SensorPayload;
pub use subscriber::{run_mqtt_subscriber, MqttSubscriberConfig};
