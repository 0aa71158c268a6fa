//! Turns windows of raw readings into leveled, trended, confidence-scored state.

mod domain;
mod error;
pub mod evidence;
mod orchestrator;
pub mod services;

#[cfg(test)]
mod tests;

pub use domain::{
    ClimateState, DerivedState, DerivedStateSnapshot, DomainState, HumidityLevel, HumidityTrend,
    LightMemory, LightState, PreviousStates, SoilMoistureLevel, SoilMoistureState,
    SoilMoistureTrend, StateSummary, TemperatureLevel, TemperatureTrend,
};
pub use error::StateError;
pub use evidence::{confidence_score, EvidenceError, EvidenceWindow, Timestamped};
pub use orchestrator::StateOrchestrator;
