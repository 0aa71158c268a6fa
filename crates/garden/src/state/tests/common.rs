use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use crate::config::policies::{
    ClimatePolicy, HumidityPolicy, LightCalibration, LightPolicy, PoliciesConfig,
    SoilCalibration, SoilMoisturePolicy, TemperaturePolicy, TrendPolicy,
};
use crate::config::sensors::{
    EvidenceConfig, IntervalConfig, SensorDomainConfig, SensorRef, SensorsConfig,
};
use crate::readings::{
    AdcPayload, ClimatePayload, ParsedReading, Reading, ReadingStore, SensorType, StoreError,
};

pub(super) const CLIMATE_SENSOR: &str = "sht31-a";
pub(super) const SOIL_SENSOR: &str = "cap-1";
pub(super) const LIGHT_SENSOR: &str = "ldr-1";

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn at(seconds: i64) -> DateTime<Utc> {
    start() + Duration::seconds(seconds)
}

pub(super) fn policies() -> PoliciesConfig {
    PoliciesConfig {
        policy_version: "2026.03-greenhouse".to_string(),
        climate: ClimatePolicy {
            min_samples: 5,
            temperature: TemperaturePolicy {
                min_c: 18.0,
                max_c: 28.0,
                trend_samples: 4,
                min_delta: 0.5,
            },
            humidity: HumidityPolicy {
                min_percent: 45.0,
                max_percent: 75.0,
                trend_samples: 4,
                min_delta: 3.0,
            },
        },
        soil_moisture: SoilMoisturePolicy {
            min_samples: 4,
            dry_threshold: 0.3,
            wet_threshold: 0.8,
            calibration: SoilCalibration {
                dry_adc: 3000,
                wet_adc: 1200,
            },
            trend: TrendPolicy {
                lookback_samples: 3,
                min_delta: 0.05,
            },
        },
        light: LightPolicy {
            min_samples: 3,
            on_threshold: 0.6,
            off_threshold: 0.3,
            calibration: LightCalibration {
                dark_adc: 200,
                bright_adc: 3800,
            },
        },
    }
}

fn domain(sensor_id: &str, sampling: u64, evidence: EvidenceConfig) -> SensorDomainConfig {
    SensorDomainConfig {
        sensors: vec![SensorRef {
            id: sensor_id.to_string(),
            model: None,
        }],
        sampling: IntervalConfig {
            interval_seconds: sampling,
        },
        evaluation: IntervalConfig {
            interval_seconds: 300,
        },
        evidence,
    }
}

/// Climate and light look back by time, soil moisture by sample count.
pub(super) fn sensors() -> SensorsConfig {
    SensorsConfig {
        climate: domain(
            CLIMATE_SENSOR,
            30,
            EvidenceConfig {
                lookback_seconds: Some(900),
                lookback_samples: None,
            },
        ),
        soil_moisture: domain(
            SOIL_SENSOR,
            60,
            EvidenceConfig {
                lookback_seconds: None,
                lookback_samples: Some(4),
            },
        ),
        light: domain(
            LIGHT_SENSOR,
            15,
            EvidenceConfig {
                lookback_seconds: Some(600),
                lookback_samples: None,
            },
        ),
    }
}

pub(super) fn climate_reading(seconds: i64, temp_c: f64, humidity_rh: f64) -> Reading {
    Reading::new(
        at(seconds),
        SensorType::Climate,
        CLIMATE_SENSOR,
        json!({ "temp_c": temp_c, "humidity_rh": humidity_rh }),
    )
}

pub(super) fn soil_reading(seconds: i64, raw_adc: u32) -> Reading {
    Reading::new(
        at(seconds),
        SensorType::SoilMoisture,
        SOIL_SENSOR,
        json!({ "raw_adc": raw_adc }),
    )
}

pub(super) fn light_reading(seconds: i64, raw_adc: u32) -> Reading {
    Reading::new(
        at(seconds),
        SensorType::Light,
        LIGHT_SENSOR,
        json!({ "raw_adc": raw_adc }),
    )
}

/// Climate samples ten seconds apart, oldest first.
pub(super) fn climate_series(samples: &[(f64, f64)]) -> Vec<ParsedReading<ClimatePayload>> {
    samples
        .iter()
        .enumerate()
        .map(|(index, (temp_c, humidity_rh))| ParsedReading {
            created: at(index as i64 * 10),
            sensor_id: CLIMATE_SENSOR.to_string(),
            payload: ClimatePayload {
                temp_c: *temp_c,
                humidity_rh: *humidity_rh,
            },
        })
        .collect()
}

/// ADC samples ten seconds apart, oldest first.
pub(super) fn adc_series(sensor_id: &str, raw: &[u32]) -> Vec<ParsedReading<AdcPayload>> {
    raw.iter()
        .enumerate()
        .map(|(index, raw_adc)| ParsedReading {
            created: at(index as i64 * 10),
            sensor_id: sensor_id.to_string(),
            payload: AdcPayload { raw_adc: *raw_adc },
        })
        .collect()
}

/// Raw light count for a normalized intensity under the fixture calibration.
pub(super) fn light_raw(intensity: f64) -> u32 {
    (200.0 + intensity * 3600.0).round() as u32
}

/// Raw soil count for a normalized moisture under the fixture calibration.
pub(super) fn soil_raw(moisture: f64) -> u32 {
    (3000.0 - moisture * 1800.0).round() as u32
}

pub(super) fn approx_eq(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    readings: Arc<Mutex<Vec<Reading>>>,
}

impl MemoryStore {
    pub(super) fn with(readings: Vec<Reading>) -> Self {
        let store = Self::default();
        store.extend(readings);
        store
    }

    pub(super) fn extend(&self, readings: Vec<Reading>) {
        let mut guard = self.readings.lock().expect("store mutex poisoned");
        guard.extend(readings);
        guard.sort_by_key(|reading| reading.created);
    }
}

impl ReadingStore for MemoryStore {
    fn fetch(
        &self,
        sensor_type: SensorType,
        sensor_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError> {
        let guard = self.readings.lock().expect("store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|reading| {
                reading.sensor_type == sensor_type
                    && reading.sensor_id == sensor_id
                    && reading.created >= window_start
                    && reading.created <= window_end
            })
            .cloned()
            .collect())
    }

    fn fetch_latest(
        &self,
        sensor_type: SensorType,
        sensor_id: &str,
    ) -> Result<Option<Reading>, StoreError> {
        let guard = self.readings.lock().expect("store mutex poisoned");
        Ok(guard
            .iter()
            .filter(|reading| reading.sensor_type == sensor_type && reading.sensor_id == sensor_id)
            .last()
            .cloned())
    }
}

pub(super) struct UnavailableStore;

impl ReadingStore for UnavailableStore {
    fn fetch(
        &self,
        _sensor_type: SensorType,
        _sensor_id: &str,
        _window_start: DateTime<Utc>,
        _window_end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch_latest(
        &self,
        _sensor_type: SensorType,
        _sensor_id: &str,
    ) -> Result<Option<Reading>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}
