//! One evaluation cycle: derive a snapshot, decide, record, and carry the light
//! memory forward.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::{PoliciesConfig, SensorsConfig, SensorsError};
use crate::decision::{
    DecisionReport, DecisionRepository, DecisionService, DecisionServiceError,
    EscalationPublisher,
};
use crate::readings::ReadingStore;
use crate::state::{PreviousStates, StateError, StateOrchestrator};

/// Long-lived monitor owning the cross-cycle state. Cycles take `&mut self`, so
/// two can never interleave on the same monitor.
pub struct GardenMonitor<S, R, E> {
    orchestrator: StateOrchestrator<S>,
    decisions: DecisionService<R, E>,
    previous: PreviousStates,
}

impl<S, R, E> GardenMonitor<S, R, E>
where
    S: ReadingStore + 'static,
    R: DecisionRepository + 'static,
    E: EscalationPublisher + 'static,
{
    pub fn new(orchestrator: StateOrchestrator<S>, decisions: DecisionService<R, E>) -> Self {
        Self {
            orchestrator,
            decisions,
            previous: PreviousStates::default(),
        }
    }

    pub fn from_config(
        store: Arc<S>,
        repository: Arc<R>,
        escalations: Arc<E>,
        policies: &PoliciesConfig,
        sensors: &SensorsConfig,
    ) -> Result<Self, SensorsError> {
        let orchestrator = StateOrchestrator::new(store, policies, sensors)?;
        let decisions =
            DecisionService::new(repository, escalations, policies.policy_version.clone());
        Ok(Self::new(orchestrator, decisions))
    }

    pub fn previous(&self) -> &PreviousStates {
        &self.previous
    }

    /// Run one cycle as of `now`. The carried state only advances once the
    /// decision is safely recorded.
    pub fn run_cycle(&mut self, now: DateTime<Utc>) -> Result<DecisionReport, CycleError> {
        let (snapshot, next) = self.orchestrator.snapshot(now, &self.previous)?;

        let missing = snapshot.missing();
        if !missing.is_empty() {
            warn!(?missing, "snapshot is missing domains");
        }

        let report = self.decisions.decide(snapshot)?;
        self.previous = next;

        info!(
            decision_id = %report.record.id.0,
            outcome = %report.record.decision.outcome,
            "evaluation cycle complete"
        );
        Ok(report)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("state derivation failed: {0}")]
    State(#[from] StateError),
    #[error("decision failed: {0}")]
    Decision(#[from] DecisionServiceError),
}
