use chrono::{DateTime, Utc};
use serde::Deserialize;

use freshsense_domain::IngestReadingInput;

/// JSON payload published by sensor firmware, e.g.
/// `{"unitId": 1, "deviceId": "ESP32-001", "voc": 120.5,
///   "temperature": 22.3, "humidity": 65.2}`.
///
/// All identifying and numeric fields are required. A payload missing any of
/// them is rejected at parse time instead of being silently defaulted, so a
/// misconfigured sensor surfaces as a parse error rather than as phantom
/// readings against a fallback unit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorPayload {
    pub unit_id: i64,
    pub device_id: String,
    pub voc: f64,
    pub temperature: f64,
    pub humidity: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl SensorPayload {
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl From<SensorPayload> for IngestReadingInput {
    fn from(payload: SensorPayload) -> Self {
        IngestReadingInput {
            unit_id: payload.unit_id,
            device_id: payload.device_id,
            voc: payload.voc,
            temperature: payload.temperature,
            humidity: payload.humidity,
            timestamp: payload.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let raw = br#"{"unitId": 1, "deviceId": "ESP32-001", "voc": 120.5,
                       "temperature": 22.3, "humidity": 65.2}"#;
        let payload = SensorPayload::parse(raw).unwrap();
        assert_eq!(payload.unit_id, 1);
        assert_eq!(payload.device_id, "ESP32-001");
        assert_eq!(payload.voc, 120.5);
        assert_eq!(payload.temperature, 22.3);
        assert_eq!(payload.humidity, 65.2);
        assert!(payload.timestamp.is_none());
    }

    #[test]
    fn test_parse_with_timestamp() {
        let raw = br#"{"unitId": 2, "deviceId": "ESP32-002", "voc": 40.0,
                       "temperature": 7.0, "humidity": 90.0,
                       "timestamp": "2026-08-30T10:00:00Z"}"#;
        let payload = SensorPayload::parse(raw).unwrap();
        assert!(payload.timestamp.is_some());
    }

    #[test]
    fn test_missing_unit_id_rejected() {
        let raw = br#"{"deviceId": "ESP32-001", "voc": 120.5,
                       "temperature": 22.3, "humidity": 65.2}"#;
        assert!(SensorPayload::parse(raw).is_err());
    }

    #[test]
    fn test_missing_voc_rejected() {
        let raw = br#"{"unitId": 1, "deviceId": "ESP32-001",
                       "temperature": 22.3, "humidity": 65.2}"#;
        assert!(SensorPayload::parse(raw).is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(SensorPayload::parse(b"not json").is_err());
    }

    #[test]
    fn test_converts_to_ingest_input() {
        let payload = SensorPayload {
            unit_id: 1,
            device_id: "ESP32-001".to_string(),
            voc: 120.5,
            temperature: 22.3,
            humidity: 65.2,
            timestamp: None,
        };
        let input: IngestReadingInput = payload.into();
        assert_eq!(input.unit_id, 1);
        assert_eq!(input.device_id, "ESP32-001");
    }
}
