//! Grow-light detection with hysteresis.
//!
//! The state only flips when every one of the last `min_samples` intensities
//! agrees: all at or above `on_threshold` to switch on, all at or below
//! `off_threshold` to switch off. Anything in between, or too few samples,
//! keeps the carried state. A cold start never assumes the light is on.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{open_window, unit_clamp, StateDeriver};
use crate::config::policies::LightPolicy;
use crate::readings::{AdcPayload, ParsedReading, SensorType};
use crate::state::domain::{LightMemory, LightState};
use crate::state::error::StateError;
use crate::state::evidence::confidence_score;

#[derive(Debug, Clone)]
pub struct LightStateService {
    policy: LightPolicy,
}

impl LightStateService {
    pub fn new(policy: LightPolicy) -> Self {
        Self { policy }
    }

    pub fn intensity(&self, raw_adc: u32) -> f64 {
        let dark = f64::from(self.policy.calibration.dark_adc);
        let bright = f64::from(self.policy.calibration.bright_adc);
        unit_clamp((f64::from(raw_adc) - dark) / (bright - dark))
    }

    fn next_is_on(&self, intensities: &[f64], previous: Option<&LightMemory>) -> bool {
        let carried = previous.map(|memory| memory.is_light_on);
        let required = self.policy.min_samples;

        // `PoliciesConfig::validate` keeps `min_samples >= 1`.
        if required == 0 || intensities.len() < required {
            return carried.unwrap_or(false);
        }

        let recent = &intensities[intensities.len() - required..];
        let all_high = recent.iter().all(|value| *value >= self.policy.on_threshold);
        let all_low = recent.iter().all(|value| *value <= self.policy.off_threshold);

        match carried {
            None => all_high,
            Some(true) => !all_low,
            Some(false) => all_high,
        }
    }
}

impl StateDeriver for LightStateService {
    const DOMAIN: SensorType = SensorType::Light;

    type Payload = AdcPayload;
    type State = LightState;
    type Memory = LightMemory;

    fn derive_state(
        &self,
        readings: &[ParsedReading<AdcPayload>],
        previous: Option<&LightMemory>,
    ) -> Result<LightState, StateError> {
        let window = open_window(Self::DOMAIN, readings)?;

        let intensities: Vec<f64> = readings
            .iter()
            .map(|reading| self.intensity(reading.payload.raw_adc))
            .collect();
        let intensity = intensities.last().copied().unwrap_or(0.0);

        let is_light_on = self.next_is_on(&intensities, previous);
        let state_started_at = match previous {
            Some(memory) if memory.is_light_on == is_light_on => memory.state_started_at,
            _ => {
                debug!(is_light_on, at = %window.window_end, "light state transition");
                window.window_end
            }
        };

        Ok(LightState {
            confidence: confidence_score(window.sample_count, self.policy.min_samples),
            intensity,
            is_light_on,
            state_started_at,
            duration_seconds: held_for(state_started_at, window.window_end),
            window,
        })
    }
}

fn held_for(since: DateTime<Utc>, until: DateTime<Utc>) -> i64 {
    (until - since).num_seconds().max(0)
}
