//! Which sensor feeds each domain, and how far back evidence is gathered.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::readings::SensorType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorsConfig {
    pub climate: SensorDomainConfig,
    pub soil_moisture: SensorDomainConfig,
    pub light: SensorDomainConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDomainConfig {
    pub sensors: Vec<SensorRef>,
    pub sampling: IntervalConfig,
    pub evaluation: IntervalConfig,
    pub evidence: EvidenceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorRef {
    pub id: String,
    /// Hardware model; informational only.
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalConfig {
    pub interval_seconds: u64,
}

/// Exactly one of the two lookback modes must be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceConfig {
    #[serde(default)]
    pub lookback_seconds: Option<u64>,
    #[serde(default)]
    pub lookback_samples: Option<usize>,
}

/// Resolved evidence lookback for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    Seconds(u64),
    Samples(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SensorsError {
    #[error("{domain}: at least one sensor must be listed")]
    NoSensors { domain: SensorType },
    #[error("{domain}: sensor ids must not be blank")]
    BlankSensorId { domain: SensorType },
    #[error("{domain}: {field}.interval_seconds must be positive")]
    ZeroInterval {
        domain: SensorType,
        field: &'static str,
    },
    #[error("{domain}: evidence must define either lookback_seconds or lookback_samples")]
    EvidenceUnset { domain: SensorType },
    #[error("{domain}: evidence cannot define both lookback_seconds and lookback_samples")]
    EvidenceAmbiguous { domain: SensorType },
    #[error("{domain}: evidence lookback must be positive")]
    ZeroLookback { domain: SensorType },
}

impl SensorsConfig {
    pub fn domain(&self, sensor_type: SensorType) -> &SensorDomainConfig {
        match sensor_type {
            SensorType::Climate => &self.climate,
            SensorType::SoilMoisture => &self.soil_moisture,
            SensorType::Light => &self.light,
        }
    }

    pub fn validate(&self) -> Result<(), SensorsError> {
        for sensor_type in SensorType::ALL {
            self.domain(sensor_type).validate(sensor_type)?;
        }
        Ok(())
    }

    /// Cadence of the combined evaluation cycle: the fastest domain wins.
    pub fn evaluation_interval(&self) -> Duration {
        let seconds = SensorType::ALL
            .iter()
            .map(|sensor_type| self.domain(*sensor_type).evaluation.interval_seconds)
            .filter(|seconds| *seconds > 0)
            .min()
            .unwrap_or(60);
        Duration::from_secs(seconds)
    }

    /// Longest span any domain's evidence window reaches back. Older readings
    /// can never be selected again.
    pub fn retention(&self) -> Duration {
        let seconds = SensorType::ALL
            .iter()
            .filter_map(|sensor_type| self.domain(*sensor_type).lookback_span(*sensor_type))
            .max()
            .unwrap_or(0);
        Duration::from_secs(seconds)
    }
}

impl SensorDomainConfig {
    /// The sensor whose readings back the domain's derived state.
    pub fn primary_sensor(&self) -> Option<&SensorRef> {
        self.sensors.first()
    }

    pub fn lookback(&self, domain: SensorType) -> Result<Lookback, SensorsError> {
        match (self.evidence.lookback_seconds, self.evidence.lookback_samples) {
            (None, None) => Err(SensorsError::EvidenceUnset { domain }),
            (Some(_), Some(_)) => Err(SensorsError::EvidenceAmbiguous { domain }),
            (Some(0), None) | (None, Some(0)) => Err(SensorsError::ZeroLookback { domain }),
            (Some(seconds), None) => Ok(Lookback::Seconds(seconds)),
            (None, Some(samples)) => Ok(Lookback::Samples(samples)),
        }
    }

    fn lookback_span(&self, domain: SensorType) -> Option<u64> {
        match self.lookback(domain).ok()? {
            Lookback::Seconds(seconds) => Some(seconds),
            Lookback::Samples(samples) => {
                let samples = u64::try_from(samples).unwrap_or(u64::MAX);
                Some(samples.saturating_mul(self.sampling.interval_seconds))
            }
        }
    }

    fn validate(&self, domain: SensorType) -> Result<(), SensorsError> {
        if self.sensors.is_empty() {
            return Err(SensorsError::NoSensors { domain });
        }
        if self.sensors.iter().any(|sensor| sensor.id.trim().is_empty()) {
            return Err(SensorsError::BlankSensorId { domain });
        }
        if self.sampling.interval_seconds == 0 {
            return Err(SensorsError::ZeroInterval {
                domain,
                field: "sampling",
            });
        }
        if self.evaluation.interval_seconds == 0 {
            return Err(SensorsError::ZeroInterval {
                domain,
                field: "evaluation",
            });
        }
        self.lookback(domain).map(|_| ())
    }
}
