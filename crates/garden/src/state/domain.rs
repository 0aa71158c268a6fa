use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evidence::EvidenceWindow;
use crate::readings::SensorType;
use crate::tags::string_tagged;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureLevel {
    TooCold,
    Ok,
    TooHot,
}

string_tagged!(TemperatureLevel, "temperature level", {
    TooCold => "too_cold",
    Ok => "ok",
    TooHot => "too_hot",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureTrend {
    Cooling,
    Stable,
    Heating,
}

string_tagged!(TemperatureTrend, "temperature trend", {
    Cooling => "cooling",
    Stable => "stable",
    Heating => "heating",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumidityLevel {
    TooDry,
    Ok,
    TooHumid,
}

string_tagged!(HumidityLevel, "humidity level", {
    TooDry => "too_dry",
    Ok => "ok",
    TooHumid => "too_humid",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumidityTrend {
    Drying,
    Stable,
    Humidifying,
}

string_tagged!(HumidityTrend, "humidity trend", {
    Drying => "drying",
    Stable => "stable",
    Humidifying => "humidifying",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilMoistureLevel {
    Dry,
    Ok,
    Wet,
}

string_tagged!(SoilMoistureLevel, "soil moisture level", {
    Dry => "dry",
    Ok => "ok",
    Wet => "wet",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilMoistureTrend {
    Drying,
    Stable,
    Wetting,
}

string_tagged!(SoilMoistureTrend, "soil moisture trend", {
    Drying => "drying",
    Stable => "stable",
    Wetting => "wetting",
});

/// Fields every per-domain derived state exposes.
pub trait DerivedState {
    fn window(&self) -> &EvidenceWindow;
    fn confidence(&self) -> f64;

    fn sample_count(&self) -> usize {
        self.window().sample_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateState {
    #[serde(flatten)]
    pub window: EvidenceWindow,
    pub confidence: f64,
    pub temperature_c: f64,
    pub humidity_rh: f64,
    pub vpd_kpa: Option<f64>,
    pub temperature_level: TemperatureLevel,
    pub temperature_trend: TemperatureTrend,
    pub humidity_level: HumidityLevel,
    pub humidity_trend: HumidityTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilMoistureState {
    #[serde(flatten)]
    pub window: EvidenceWindow,
    pub confidence: f64,
    /// Mean normalized moisture over the window; 0.0 is bone dry, 1.0 saturated.
    pub avg_moisture: f64,
    pub level: SoilMoistureLevel,
    pub trend: SoilMoistureTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    #[serde(flatten)]
    pub window: EvidenceWindow,
    pub confidence: f64,
    pub intensity: f64,
    pub is_light_on: bool,
    pub state_started_at: DateTime<Utc>,
    /// Seconds the current on/off state has held as of `window_end`.
    pub duration_seconds: i64,
}

impl LightState {
    pub fn memory(&self) -> LightMemory {
        LightMemory {
            is_light_on: self.is_light_on,
            state_started_at: self.state_started_at,
        }
    }
}

macro_rules! derived_state {
    ($($ty:ty),+) => {
        $(
            impl DerivedState for $ty {
                fn window(&self) -> &EvidenceWindow {
                    &self.window
                }

                fn confidence(&self) -> f64 {
                    self.confidence
                }
            }
        )+
    };
}

derived_state!(ClimateState, SoilMoistureState, LightState);

/// The part of a light state carried into the next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightMemory {
    pub is_light_on: bool,
    pub state_started_at: DateTime<Utc>,
}

/// State threaded between evaluation cycles by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousStates {
    pub light: Option<LightMemory>,
}

impl PreviousStates {
    /// Memory for the next cycle. A cycle without light evidence keeps what
    /// was known before rather than forgetting it.
    pub fn advance(&self, snapshot: &DerivedStateSnapshot) -> Self {
        Self {
            light: snapshot
                .light
                .as_ref()
                .map(LightState::memory)
                .or(self.light),
        }
    }
}

/// One derived state, tagged by domain.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainState {
    Climate(ClimateState),
    SoilMoisture(SoilMoistureState),
    Light(LightState),
}

/// Confidence and sample count of one present domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateSummary {
    pub domain: SensorType,
    pub confidence: f64,
    pub sample_count: usize,
}

/// Point-in-time bundle of every domain's derived state. Domains with no
/// readings in their window are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedStateSnapshot {
    pub created: DateTime<Utc>,
    pub climate: Option<ClimateState>,
    pub soil_moisture: Option<SoilMoistureState>,
    pub light: Option<LightState>,
}

impl DerivedStateSnapshot {
    pub fn empty(created: DateTime<Utc>) -> Self {
        Self {
            created,
            climate: None,
            soil_moisture: None,
            light: None,
        }
    }

    pub(crate) fn insert(&mut self, state: DomainState) {
        match state {
            DomainState::Climate(state) => self.climate = Some(state),
            DomainState::SoilMoisture(state) => self.soil_moisture = Some(state),
            DomainState::Light(state) => self.light = Some(state),
        }
    }

    pub fn is_present(&self, domain: SensorType) -> bool {
        self.summary(domain).is_some()
    }

    pub fn summary(&self, domain: SensorType) -> Option<StateSummary> {
        match domain {
            SensorType::Climate => self.climate.as_ref().map(|state| summarize(domain, state)),
            SensorType::SoilMoisture => self
                .soil_moisture
                .as_ref()
                .map(|state| summarize(domain, state)),
            SensorType::Light => self.light.as_ref().map(|state| summarize(domain, state)),
        }
    }

    /// Present domains in climate, soil moisture, light order.
    pub fn summaries(&self) -> Vec<StateSummary> {
        SensorType::ALL
            .iter()
            .filter_map(|domain| self.summary(*domain))
            .collect()
    }

    pub fn missing(&self) -> Vec<SensorType> {
        SensorType::ALL
            .into_iter()
            .filter(|domain| !self.is_present(*domain))
            .collect()
    }
}

fn summarize<S: DerivedState>(domain: SensorType, state: &S) -> StateSummary {
    StateSummary {
        domain,
        confidence: state.confidence(),
        sample_count: state.sample_count(),
    }
}
