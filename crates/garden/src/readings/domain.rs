use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tags::string_tagged;

/// Sensor families the engine derives state for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Climate,
    SoilMoisture,
    Light,
}

string_tagged!(SensorType, "sensor type", {
    Climate => "climate",
    SoilMoisture => "soil_moisture",
    Light => "light",
});

impl SensorType {
    /// Every domain, in the order snapshots are assembled.
    pub const ALL: [SensorType; 3] = [
        SensorType::Climate,
        SensorType::SoilMoisture,
        SensorType::Light,
    ];
}

/// Reading as stored by the ingestion side. The payload stays untyped until a
/// domain service parses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub created: DateTime<Utc>,
    pub sensor_type: SensorType,
    pub sensor_id: String,
    pub payload: Value,
}

impl Reading {
    pub fn new(
        created: DateTime<Utc>,
        sensor_type: SensorType,
        sensor_id: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            created,
            sensor_type,
            sensor_id: sensor_id.into(),
            payload,
        }
    }

    /// Decode the payload into a domain-specific record.
    pub fn parse<P: DeserializeOwned>(&self) -> Result<ParsedReading<P>, serde_json::Error> {
        let payload = P::deserialize(&self.payload)?;
        Ok(ParsedReading {
            created: self.created,
            sensor_id: self.sensor_id.clone(),
            payload,
        })
    }
}

/// Reading whose payload has been validated against its domain schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReading<P> {
    pub created: DateTime<Utc>,
    pub sensor_id: String,
    pub payload: P,
}

/// Combined temperature/humidity sensor output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimatePayload {
    #[serde(alias = "temp")]
    pub temp_c: f64,
    #[serde(alias = "humidity")]
    pub humidity_rh: f64,
}

/// Raw analog-to-digital count, shared by the soil moisture and light sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdcPayload {
    pub raw_adc: u32,
}
