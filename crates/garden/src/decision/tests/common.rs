use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::decision::{
    Decision, DecisionId, DecisionRecord, DecisionRepository, DecisionService, Escalation,
    EscalationError, EscalationPublisher, RepositoryError,
};
use crate::state::evidence::EvidenceWindow;
use crate::state::{
    ClimateState, DerivedStateSnapshot, HumidityLevel, HumidityTrend, LightState,
    SoilMoistureLevel, SoilMoistureState, SoilMoistureTrend, TemperatureLevel, TemperatureTrend,
};

pub(super) const POLICY_VERSION: &str = "2026.03-greenhouse";

pub(super) fn evaluated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn window(sample_count: usize) -> EvidenceWindow {
    EvidenceWindow {
        window_start: evaluated_at() - Duration::minutes(10),
        window_end: evaluated_at(),
        sample_count,
    }
}

pub(super) fn climate(confidence: f64) -> ClimateState {
    ClimateState {
        window: window(5),
        confidence,
        temperature_c: 23.0,
        humidity_rh: 60.0,
        vpd_kpa: Some(1.12),
        temperature_level: TemperatureLevel::Ok,
        temperature_trend: TemperatureTrend::Stable,
        humidity_level: HumidityLevel::Ok,
        humidity_trend: HumidityTrend::Stable,
    }
}

pub(super) fn soil_moisture(confidence: f64) -> SoilMoistureState {
    SoilMoistureState {
        window: window(4),
        confidence,
        avg_moisture: 0.55,
        level: SoilMoistureLevel::Ok,
        trend: SoilMoistureTrend::Stable,
    }
}

pub(super) fn light(confidence: f64) -> LightState {
    LightState {
        window: window(3),
        confidence,
        intensity: 0.9,
        is_light_on: true,
        state_started_at: evaluated_at() - Duration::hours(2),
        duration_seconds: 7200,
    }
}

/// Every domain present, in range, and fully trusted.
pub(super) fn healthy_snapshot() -> DerivedStateSnapshot {
    DerivedStateSnapshot {
        created: evaluated_at(),
        climate: Some(climate(1.0)),
        soil_moisture: Some(soil_moisture(1.0)),
        light: Some(light(1.0)),
    }
}

pub(super) fn hot_snapshot() -> DerivedStateSnapshot {
    let mut snapshot = healthy_snapshot();
    if let Some(climate) = snapshot.climate.as_mut() {
        climate.temperature_c = 31.5;
        climate.temperature_level = TemperatureLevel::TooHot;
    }
    snapshot
}

pub(super) fn build_service() -> (
    DecisionService<MemoryDecisionLog, MemoryEscalations>,
    Arc<MemoryDecisionLog>,
    Arc<MemoryEscalations>,
) {
    let repository = Arc::new(MemoryDecisionLog::default());
    let escalations = Arc::new(MemoryEscalations::default());
    let service = DecisionService::new(repository.clone(), escalations.clone(), POLICY_VERSION);
    (service, repository, escalations)
}

#[derive(Default, Clone)]
pub(super) struct MemoryDecisionLog {
    records: Arc<Mutex<Vec<DecisionRecord>>>,
}

impl MemoryDecisionLog {
    pub(super) fn records(&self) -> Vec<DecisionRecord> {
        self.records.lock().expect("log mutex poisoned").clone()
    }
}

impl DecisionRepository for MemoryDecisionLog {
    fn save(
        &self,
        decision: Decision,
        snapshot: DerivedStateSnapshot,
    ) -> Result<DecisionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("log mutex poisoned");
        let record = DecisionRecord {
            id: DecisionId(format!("dec-{}", guard.len() + 1)),
            decision,
            snapshot,
        };
        guard.push(record.clone());
        Ok(record)
    }

    fn latest(&self) -> Result<Option<DecisionRecord>, RepositoryError> {
        Ok(self.records.lock().expect("log mutex poisoned").last().cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<DecisionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("log mutex poisoned");
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

pub(super) struct UnavailableDecisionLog;

impl DecisionRepository for UnavailableDecisionLog {
    fn save(
        &self,
        _decision: Decision,
        _snapshot: DerivedStateSnapshot,
    ) -> Result<DecisionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest(&self) -> Result<Option<DecisionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<DecisionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryEscalations {
    events: Arc<Mutex<Vec<Escalation>>>,
}

impl MemoryEscalations {
    pub(super) fn events(&self) -> Vec<Escalation> {
        self.events.lock().expect("escalation mutex poisoned").clone()
    }
}

impl EscalationPublisher for MemoryEscalations {
    fn publish(&self, escalation: &Escalation) -> Result<(), EscalationError> {
        self.events
            .lock()
            .expect("escalation mutex poisoned")
            .push(escalation.clone());
        Ok(())
    }
}

pub(super) struct OfflineEscalations;

impl EscalationPublisher for OfflineEscalations {
    fn publish(&self, _escalation: &Escalation) -> Result<(), EscalationError> {
        Err(EscalationError::Transport("webhook timed out".to_string()))
    }
}
