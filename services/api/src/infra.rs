use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use garden::cycle::GardenMonitor;
use garden::decision::{
    Decision, DecisionId, DecisionRecord, DecisionRepository, Escalation, EscalationError,
    EscalationPublisher, RepositoryError,
};
use garden::readings::{import, Reading, ReadingStore, SensorType, StoreError};
use garden::state::DerivedStateSnapshot;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{debug, warn};

pub(crate) type Monitor =
    GardenMonitor<InMemoryReadingStore, InMemoryDecisionLog, LoggingEscalationPublisher>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Readings per `(sensor_type, sensor_id)`, each run kept ascending by `created`.
///
/// With a retention set, readings older than the newest one in their series by
/// more than the retention are dropped on insert.
#[derive(Default, Clone)]
pub(crate) struct InMemoryReadingStore {
    series: Arc<Mutex<BTreeMap<(SensorType, String), Vec<Reading>>>>,
    retention: Option<Duration>,
}

impl InMemoryReadingStore {
    pub(crate) fn with_retention(retention: std::time::Duration) -> Self {
        Self {
            series: Arc::default(),
            retention: Duration::from_std(retention).ok(),
        }
    }

    pub(crate) fn insert(&self, readings: Vec<Reading>) -> Result<usize, StoreError> {
        let mut guard = self
            .series
            .lock()
            .map_err(|_| StoreError::Unavailable("reading store lock poisoned".to_string()))?;

        let count = readings.len();
        for reading in readings {
            let series = guard
                .entry((reading.sensor_type, reading.sensor_id.clone()))
                .or_default();
            let at = series.partition_point(|existing| existing.created <= reading.created);
            series.insert(at, reading);
        }

        if let Some(retention) = self.retention {
            for series in guard.values_mut() {
                let Some(cutoff) = series.last().map(|newest| newest.created - retention) else {
                    continue;
                };
                let stale = series.partition_point(|reading| reading.created < cutoff);
                if stale > 0 {
                    series.drain(..stale);
                    debug!(dropped = stale, "pruned readings past retention");
                }
            }
        }
        Ok(count)
    }

    pub(crate) fn from_readings(readings: Vec<Reading>) -> Result<Self, StoreError> {
        let store = Self::default();
        store.insert(readings)?;
        Ok(store)
    }
}

impl ReadingStore for InMemoryReadingStore {
    fn fetch(
        &self,
        sensor_type: SensorType,
        sensor_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError> {
        let guard = self
            .series
            .lock()
            .map_err(|_| StoreError::Unavailable("reading store lock poisoned".to_string()))?;
        let Some(series) = guard.get(&(sensor_type, sensor_id.to_string())) else {
            return Ok(Vec::new());
        };

        let from = series.partition_point(|reading| reading.created < window_start);
        let to = series.partition_point(|reading| reading.created <= window_end);
        Ok(series[from..to.max(from)].to_vec())
    }

    fn fetch_latest(
        &self,
        sensor_type: SensorType,
        sensor_id: &str,
    ) -> Result<Option<Reading>, StoreError> {
        let guard = self
            .series
            .lock()
            .map_err(|_| StoreError::Unavailable("reading store lock poisoned".to_string()))?;
        Ok(guard
            .get(&(sensor_type, sensor_id.to_string()))
            .and_then(|series| series.last().cloned()))
    }
}

/// Append-only decision log held in process memory.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDecisionLog {
    records: Arc<Mutex<Vec<DecisionRecord>>>,
}

impl DecisionRepository for InMemoryDecisionLog {
    fn save(
        &self,
        decision: Decision,
        snapshot: DerivedStateSnapshot,
    ) -> Result<DecisionRecord, RepositoryError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Write("decision log lock poisoned".to_string()))?;
        let record = DecisionRecord {
            id: DecisionId(format!("dec-{:06}", guard.len() + 1)),
            decision,
            snapshot,
        };
        guard.push(record.clone());
        Ok(record)
    }

    fn latest(&self) -> Result<Option<DecisionRecord>, RepositoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("decision log lock poisoned".to_string()))?;
        Ok(guard.last().cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<DecisionRecord>, RepositoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("decision log lock poisoned".to_string()))?;
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

/// Stand-in for the alerting channel: escalations land in the service log.
#[derive(Default, Clone, Copy)]
pub(crate) struct LoggingEscalationPublisher;

impl EscalationPublisher for LoggingEscalationPublisher {
    fn publish(&self, escalation: &Escalation) -> Result<(), EscalationError> {
        let reasons: Vec<String> = escalation.reasons.iter().map(|r| r.summary()).collect();
        warn!(
            decision_id = %escalation.decision_id.0,
            outcome = %escalation.outcome,
            confidence = escalation.confidence,
            reasons = %reasons.join("; "),
            "garden needs attention"
        );
        Ok(())
    }
}

pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    import::parse_timestamp(raw)
        .ok_or_else(|| format!("failed to parse '{raw}' as an RFC 3339 timestamp"))
}
