use super::{drift, open_window, unit_clamp, StateDeriver};
use crate::config::policies::SoilMoisturePolicy;
use crate::readings::{AdcPayload, ParsedReading, SensorType};
use crate::state::domain::{SoilMoistureLevel, SoilMoistureState};
use crate::state::error::StateError;
use crate::state::evidence::confidence_score;

#[derive(Debug, Clone)]
pub struct SoilMoistureStateService {
    policy: SoilMoisturePolicy,
}

impl SoilMoistureStateService {
    pub fn new(policy: SoilMoisturePolicy) -> Self {
        Self { policy }
    }

    /// Map a raw count onto `[0, 1]`, where 0.0 is the dry reference point and
    /// 1.0 the wet one.
    pub fn normalize(&self, raw_adc: u32) -> f64 {
        let dry = f64::from(self.policy.calibration.dry_adc);
        let wet = f64::from(self.policy.calibration.wet_adc);
        unit_clamp((dry - f64::from(raw_adc)) / (dry - wet))
    }

    fn level(&self, avg_moisture: f64) -> SoilMoistureLevel {
        if avg_moisture <= self.policy.dry_threshold {
            SoilMoistureLevel::Dry
        } else if avg_moisture >= self.policy.wet_threshold {
            SoilMoistureLevel::Wet
        } else {
            SoilMoistureLevel::Ok
        }
    }
}

impl StateDeriver for SoilMoistureStateService {
    const DOMAIN: SensorType = SensorType::SoilMoisture;

    type Payload = AdcPayload;
    type State = SoilMoistureState;
    type Memory = ();

    fn derive_state(
        &self,
        readings: &[ParsedReading<AdcPayload>],
        _previous: Option<&()>,
    ) -> Result<SoilMoistureState, StateError> {
        let window = open_window(Self::DOMAIN, readings)?;

        let moisture: Vec<f64> = readings
            .iter()
            .map(|reading| self.normalize(reading.payload.raw_adc))
            .collect();
        let avg_moisture = moisture.iter().sum::<f64>() / moisture.len() as f64;

        let trend = &self.policy.trend;

        Ok(SoilMoistureState {
            confidence: confidence_score(window.sample_count, self.policy.min_samples),
            window,
            avg_moisture,
            level: self.level(avg_moisture),
            trend: drift(&moisture, trend.lookback_samples, trend.min_delta).into(),
        })
    }
}
