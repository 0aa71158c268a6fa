use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::domain::{DerivedStateSnapshot, DomainState, PreviousStates};
use super::error::StateError;
use super::services::{
    parse_readings, ClimateStateService, LightStateService, SoilMoistureStateService,
    StateDeriver,
};
use crate::config::policies::PoliciesConfig;
use crate::config::sensors::{Lookback, SensorsConfig, SensorsError};
use crate::readings::{Reading, ReadingStore, SensorType};

/// Where one domain's evidence comes from.
#[derive(Debug, Clone)]
struct EvidencePlan {
    sensor_id: String,
    lookback: Lookback,
    sampling_interval_seconds: u64,
}

impl EvidencePlan {
    fn resolve(sensors: &SensorsConfig, domain: SensorType) -> Result<Self, SensorsError> {
        let config = sensors.domain(domain);
        let sensor = config
            .primary_sensor()
            .ok_or(SensorsError::NoSensors { domain })?;

        Ok(Self {
            sensor_id: sensor.id.clone(),
            lookback: config.lookback(domain)?,
            sampling_interval_seconds: config.sampling.interval_seconds,
        })
    }
}

/// Gathers each domain's readings, delegates to its state service, and
/// assembles the cycle's snapshot.
pub struct StateOrchestrator<S> {
    store: Arc<S>,
    climate: ClimateStateService,
    soil_moisture: SoilMoistureStateService,
    light: LightStateService,
    climate_plan: EvidencePlan,
    soil_moisture_plan: EvidencePlan,
    light_plan: EvidencePlan,
}

impl<S> StateOrchestrator<S>
where
    S: ReadingStore + 'static,
{
    pub fn new(
        store: Arc<S>,
        policies: &PoliciesConfig,
        sensors: &SensorsConfig,
    ) -> Result<Self, SensorsError> {
        Ok(Self {
            store,
            climate: ClimateStateService::new(policies.climate.clone()),
            soil_moisture: SoilMoistureStateService::new(policies.soil_moisture.clone()),
            light: LightStateService::new(policies.light.clone()),
            climate_plan: EvidencePlan::resolve(sensors, SensorType::Climate)?,
            soil_moisture_plan: EvidencePlan::resolve(sensors, SensorType::SoilMoisture)?,
            light_plan: EvidencePlan::resolve(sensors, SensorType::Light)?,
        })
    }

    /// Derive every domain as of `now`. Returns the snapshot together with the
    /// memory the next cycle should be handed; `previous` itself is untouched.
    pub fn snapshot(
        &self,
        now: DateTime<Utc>,
        previous: &PreviousStates,
    ) -> Result<(DerivedStateSnapshot, PreviousStates), StateError> {
        let mut snapshot = DerivedStateSnapshot::empty(now);

        for domain in SensorType::ALL {
            let readings = self.collect(domain, now)?;
            if readings.is_empty() {
                info!(%domain, "no readings in lookback window, domain absent");
                continue;
            }

            let state = self.derive(domain, &readings, previous)?;
            snapshot.insert(state);
        }

        let next = previous.advance(&snapshot);
        Ok((snapshot, next))
    }

    fn plan(&self, domain: SensorType) -> &EvidencePlan {
        match domain {
            SensorType::Climate => &self.climate_plan,
            SensorType::SoilMoisture => &self.soil_moisture_plan,
            SensorType::Light => &self.light_plan,
        }
    }

    fn collect(&self, domain: SensorType, now: DateTime<Utc>) -> Result<Vec<Reading>, StateError> {
        let plan = self.plan(domain);

        let readings = match plan.lookback {
            Lookback::Seconds(seconds) => {
                let start = lookback_start(now, seconds);
                self.store.fetch(domain, &plan.sensor_id, start, now)?
            }
            Lookback::Samples(count) => {
                if self.store.fetch_latest(domain, &plan.sensor_id)?.is_none() {
                    return Ok(Vec::new());
                }

                let span = plan.sampling_interval_seconds.saturating_mul(count as u64);
                let start = lookback_start(now, span);
                let mut readings = self.store.fetch(domain, &plan.sensor_id, start, now)?;
                if readings.len() > count {
                    readings.drain(..readings.len() - count);
                }
                readings
            }
        };

        debug!(
            %domain,
            sensor_id = %plan.sensor_id,
            samples = readings.len(),
            "collected readings"
        );
        Ok(readings)
    }

    fn derive(
        &self,
        domain: SensorType,
        readings: &[Reading],
        previous: &PreviousStates,
    ) -> Result<DomainState, StateError> {
        match domain {
            SensorType::Climate => {
                let parsed = parse_readings(domain, readings)?;
                self.climate
                    .derive_state(&parsed, None)
                    .map(DomainState::Climate)
            }
            SensorType::SoilMoisture => {
                let parsed = parse_readings(domain, readings)?;
                self.soil_moisture
                    .derive_state(&parsed, None)
                    .map(DomainState::SoilMoisture)
            }
            SensorType::Light => {
                let parsed = parse_readings(domain, readings)?;
                self.light
                    .derive_state(&parsed, previous.light.as_ref())
                    .map(DomainState::Light)
            }
        }
    }
}

fn lookback_start(now: DateTime<Utc>, seconds: u64) -> DateTime<Utc> {
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
