//! Thresholds and calibration used to interpret readings.
//!
//! Boundary comparisons in the state services are inclusive, so validation
//! insists on strictly ordered thresholds: an exact-boundary value can only
//! ever match one band.

use serde::{Deserialize, Serialize};

/// Root policy document. `policy_version` is stamped on every decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoliciesConfig {
    pub policy_version: String,
    pub climate: ClimatePolicy,
    pub soil_moisture: SoilMoisturePolicy,
    pub light: LightPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimatePolicy {
    /// Samples needed for full confidence.
    pub min_samples: usize,
    pub temperature: TemperaturePolicy,
    pub humidity: HumidityPolicy,
}

/// Acceptable temperature band and trend sensitivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePolicy {
    pub min_c: f64,
    pub max_c: f64,
    pub trend_samples: usize,
    pub min_delta: f64,
}

/// Acceptable relative humidity band and trend sensitivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumidityPolicy {
    pub min_percent: f64,
    pub max_percent: f64,
    pub trend_samples: usize,
    pub min_delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilMoisturePolicy {
    pub min_samples: usize,
    pub dry_threshold: f64,
    pub wet_threshold: f64,
    pub calibration: SoilCalibration,
    pub trend: TrendPolicy,
}

/// ADC reference points. The probe is inverted: a higher count means drier soil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoilCalibration {
    pub dry_adc: u32,
    pub wet_adc: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPolicy {
    pub lookback_samples: usize,
    pub min_delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightPolicy {
    pub min_samples: usize,
    pub on_threshold: f64,
    pub off_threshold: f64,
    pub calibration: LightCalibration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightCalibration {
    pub dark_adc: u32,
    pub bright_adc: u32,
}

/// Validation errors raised for a policy document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("policy_version must not be empty")]
    MissingVersion,
    #[error("{field} must be at least {min} (found {found})")]
    TooFewSamples {
        field: &'static str,
        min: usize,
        found: usize,
    },
    #[error("{field} must be a positive, finite number (found {found})")]
    NonPositive { field: &'static str, found: f64 },
    #[error("{field}: lower bound {low} must be strictly below upper bound {high}")]
    Unordered {
        field: &'static str,
        low: f64,
        high: f64,
    },
    #[error("{field} must lie within [0, 1] (found {found})")]
    OutsideUnitInterval { field: &'static str, found: f64 },
}

impl PoliciesConfig {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.policy_version.trim().is_empty() {
            return Err(PolicyError::MissingVersion);
        }
        self.climate.validate()?;
        self.soil_moisture.validate()?;
        self.light.validate()
    }
}

impl ClimatePolicy {
    fn validate(&self) -> Result<(), PolicyError> {
        at_least("climate.min_samples", self.min_samples, 1)?;

        let temperature = &self.temperature;
        ordered(
            "climate.temperature.min_c/max_c",
            temperature.min_c,
            temperature.max_c,
        )?;
        at_least(
            "climate.temperature.trend_samples",
            temperature.trend_samples,
            2,
        )?;
        positive("climate.temperature.min_delta", temperature.min_delta)?;

        let humidity = &self.humidity;
        ordered(
            "climate.humidity.min_percent/max_percent",
            humidity.min_percent,
            humidity.max_percent,
        )?;
        at_least("climate.humidity.trend_samples", humidity.trend_samples, 2)?;
        positive("climate.humidity.min_delta", humidity.min_delta)
    }
}

impl SoilMoisturePolicy {
    fn validate(&self) -> Result<(), PolicyError> {
        at_least("soil_moisture.min_samples", self.min_samples, 1)?;
        unit("soil_moisture.dry_threshold", self.dry_threshold)?;
        unit("soil_moisture.wet_threshold", self.wet_threshold)?;
        ordered(
            "soil_moisture.dry_threshold/wet_threshold",
            self.dry_threshold,
            self.wet_threshold,
        )?;
        ordered(
            "soil_moisture.calibration.wet_adc/dry_adc",
            f64::from(self.calibration.wet_adc),
            f64::from(self.calibration.dry_adc),
        )?;
        at_least(
            "soil_moisture.trend.lookback_samples",
            self.trend.lookback_samples,
            2,
        )?;
        positive("soil_moisture.trend.min_delta", self.trend.min_delta)
    }
}

impl LightPolicy {
    fn validate(&self) -> Result<(), PolicyError> {
        at_least("light.min_samples", self.min_samples, 1)?;
        unit("light.on_threshold", self.on_threshold)?;
        unit("light.off_threshold", self.off_threshold)?;
        ordered(
            "light.off_threshold/on_threshold",
            self.off_threshold,
            self.on_threshold,
        )?;
        ordered(
            "light.calibration.dark_adc/bright_adc",
            f64::from(self.calibration.dark_adc),
            f64::from(self.calibration.bright_adc),
        )
    }
}

fn at_least(field: &'static str, found: usize, min: usize) -> Result<(), PolicyError> {
    if found < min {
        return Err(PolicyError::TooFewSamples { field, min, found });
    }
    Ok(())
}

fn positive(field: &'static str, found: f64) -> Result<(), PolicyError> {
    if !(found.is_finite() && found > 0.0) {
        return Err(PolicyError::NonPositive { field, found });
    }
    Ok(())
}

fn ordered(field: &'static str, low: f64, high: f64) -> Result<(), PolicyError> {
    if !(low.is_finite() && high.is_finite() && low < high) {
        return Err(PolicyError::Unordered { field, low, high });
    }
    Ok(())
}

fn unit(field: &'static str, found: f64) -> Result<(), PolicyError> {
    if !(0.0..=1.0).contains(&found) {
        return Err(PolicyError::OutsideUnitInterval { field, found });
    }
    Ok(())
}
