//! Per-domain derivation services sharing one capability contract.

mod climate;
mod light;
mod soil_moisture;

pub use climate::{vapour_pressure_deficit, ClimateStateService};
pub use light::LightStateService;
pub use soil_moisture::SoilMoistureStateService;

use serde::de::DeserializeOwned;
use tracing::error;

use super::domain::{DerivedState, HumidityTrend, SoilMoistureTrend, TemperatureTrend};
use super::error::StateError;
use super::evidence::{EvidenceWindow, Timestamped};
use crate::readings::{ParsedReading, Reading, SensorType};

/// Turns a created-ascending run of typed readings into one derived state.
pub trait StateDeriver {
    const DOMAIN: SensorType;

    type Payload: DeserializeOwned;
    type State: DerivedState;
    /// Value carried from the previous cycle; `()` for domains without memory.
    type Memory;

    fn derive_state(
        &self,
        readings: &[ParsedReading<Self::Payload>],
        previous: Option<&Self::Memory>,
    ) -> Result<Self::State, StateError>;
}

/// Decode stored readings for `domain`, refusing foreign or malformed ones.
pub fn parse_readings<P: DeserializeOwned>(
    domain: SensorType,
    readings: &[Reading],
) -> Result<Vec<ParsedReading<P>>, StateError> {
    readings
        .iter()
        .map(|reading| {
            if reading.sensor_type != domain {
                error!(%domain, found = %reading.sensor_type, sensor_id = %reading.sensor_id, "reading routed to wrong domain");
                return Err(StateError::UnexpectedSensorType {
                    domain,
                    found: reading.sensor_type,
                    sensor_id: reading.sensor_id.clone(),
                });
            }

            reading.parse().map_err(|source| {
                error!(%domain, sensor_id = %reading.sensor_id, %source, "invalid payload");
                StateError::InvalidPayload {
                    domain,
                    sensor_id: reading.sensor_id.clone(),
                    created: reading.created,
                    source,
                }
            })
        })
        .collect()
}

/// Evidence window for a service's input, failing loudly on empty input.
pub(crate) fn open_window<T: Timestamped>(
    domain: SensorType,
    readings: &[T],
) -> Result<EvidenceWindow, StateError> {
    if readings.is_empty() {
        error!(%domain, "state service received 0 sensor readings");
        return Err(StateError::NoReadings { domain });
    }

    EvidenceWindow::from_readings(readings).map_err(|source| StateError::Evidence { domain, source })
}

/// Direction of change over a trailing run of samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Drift {
    Falling,
    Steady,
    Rising,
}

/// Compares the first and last of the trailing `lookback` values. Fewer values
/// than that is not enough evidence to call a direction.
pub(crate) fn drift(values: &[f64], lookback: usize, min_delta: f64) -> Drift {
    // Validated policies keep `lookback >= 2`; zero only reaches here unvalidated.
    if lookback == 0 || values.len() < lookback {
        return Drift::Steady;
    }

    let recent = &values[values.len() - lookback..];
    let delta = recent[recent.len() - 1] - recent[0];

    if delta >= min_delta {
        Drift::Rising
    } else if delta <= -min_delta {
        Drift::Falling
    } else {
        Drift::Steady
    }
}

impl From<Drift> for TemperatureTrend {
    fn from(value: Drift) -> Self {
        match value {
            Drift::Falling => TemperatureTrend::Cooling,
            Drift::Steady => TemperatureTrend::Stable,
            Drift::Rising => TemperatureTrend::Heating,
        }
    }
}

impl From<Drift> for HumidityTrend {
    fn from(value: Drift) -> Self {
        match value {
            Drift::Falling => HumidityTrend::Drying,
            Drift::Steady => HumidityTrend::Stable,
            Drift::Rising => HumidityTrend::Humidifying,
        }
    }
}

impl From<Drift> for SoilMoistureTrend {
    fn from(value: Drift) -> Self {
        match value {
            Drift::Falling => SoilMoistureTrend::Drying,
            Drift::Steady => SoilMoistureTrend::Stable,
            Drift::Rising => SoilMoistureTrend::Wetting,
        }
    }
}

/// Clamp a linear ADC mapping into `[0, 1]`.
pub(crate) fn unit_clamp(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
