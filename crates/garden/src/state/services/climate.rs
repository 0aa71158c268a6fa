use super::{drift, open_window, StateDeriver};
use crate::config::policies::ClimatePolicy;
use crate::readings::{ClimatePayload, ParsedReading, SensorType};
use crate::state::domain::{ClimateState, HumidityLevel, TemperatureLevel};
use crate::state::error::StateError;
use crate::state::evidence::confidence_score;

/// Levels come from the latest reading; trends from the trailing samples.
#[derive(Debug, Clone)]
pub struct ClimateStateService {
    policy: ClimatePolicy,
}

impl ClimateStateService {
    pub fn new(policy: ClimatePolicy) -> Self {
        Self { policy }
    }

    fn temperature_level(&self, value_c: f64) -> TemperatureLevel {
        let band = &self.policy.temperature;
        if value_c < band.min_c {
            TemperatureLevel::TooCold
        } else if value_c > band.max_c {
            TemperatureLevel::TooHot
        } else {
            TemperatureLevel::Ok
        }
    }

    fn humidity_level(&self, value_rh: f64) -> HumidityLevel {
        let band = &self.policy.humidity;
        if value_rh < band.min_percent {
            HumidityLevel::TooDry
        } else if value_rh > band.max_percent {
            HumidityLevel::TooHumid
        } else {
            HumidityLevel::Ok
        }
    }
}

impl StateDeriver for ClimateStateService {
    const DOMAIN: SensorType = SensorType::Climate;

    type Payload = ClimatePayload;
    type State = ClimateState;
    type Memory = ();

    fn derive_state(
        &self,
        readings: &[ParsedReading<ClimatePayload>],
        _previous: Option<&()>,
    ) -> Result<ClimateState, StateError> {
        let window = open_window(Self::DOMAIN, readings)?;
        let Some(latest) = readings.last().map(|reading| reading.payload) else {
            return Err(StateError::NoReadings {
                domain: Self::DOMAIN,
            });
        };

        let temperatures: Vec<f64> = readings.iter().map(|r| r.payload.temp_c).collect();
        let humidities: Vec<f64> = readings.iter().map(|r| r.payload.humidity_rh).collect();

        let temperature = &self.policy.temperature;
        let humidity = &self.policy.humidity;

        Ok(ClimateState {
            confidence: confidence_score(window.sample_count, self.policy.min_samples),
            window,
            temperature_c: latest.temp_c,
            humidity_rh: latest.humidity_rh,
            vpd_kpa: vapour_pressure_deficit(latest.temp_c, latest.humidity_rh),
            temperature_level: self.temperature_level(latest.temp_c),
            temperature_trend: drift(
                &temperatures,
                temperature.trend_samples,
                temperature.min_delta,
            )
            .into(),
            humidity_level: self.humidity_level(latest.humidity_rh),
            humidity_trend: drift(&humidities, humidity.trend_samples, humidity.min_delta).into(),
        })
    }
}

/// Vapour pressure deficit in kPa (Tetens approximation). `None` when the
/// inputs cannot describe real air.
pub fn vapour_pressure_deficit(temp_c: f64, humidity_rh: f64) -> Option<f64> {
    if !temp_c.is_finite() || !humidity_rh.is_finite() || temp_c <= -237.3 {
        return None;
    }

    let saturation = 0.6108 * ((17.27 * temp_c) / (temp_c + 237.3)).exp();
    let relative = humidity_rh.clamp(0.0, 100.0) / 100.0;
    Some((saturation * (1.0 - relative)).max(0.0))
}
