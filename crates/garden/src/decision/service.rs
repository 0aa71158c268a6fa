use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::DecisionRecord;
use super::engine::DecisionEngine;
use super::repository::{DecisionRepository, Escalation, EscalationPublisher, RepositoryError};
use crate::state::DerivedStateSnapshot;

/// Service composing the decision engine, the decision log and the escalation hook.
pub struct DecisionService<R, E> {
    engine: DecisionEngine,
    repository: Arc<R>,
    escalations: Arc<E>,
}

/// What happened to the escalation hook for one decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum EscalationStatus {
    NotRequired,
    Delivered,
    Failed(String),
}

/// A recorded decision plus the fate of its escalation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionReport {
    pub record: DecisionRecord,
    pub escalation: EscalationStatus,
}

impl<R, E> DecisionService<R, E>
where
    R: DecisionRepository + 'static,
    E: EscalationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, escalations: Arc<E>, policy_version: impl Into<String>) -> Self {
        Self {
            engine: DecisionEngine::new(policy_version),
            repository,
            escalations,
        }
    }

    /// Decide on `snapshot` and record the result. A decision that cannot be
    /// recorded was not made: the repository error is returned and nothing is
    /// escalated.
    pub fn decide(
        &self,
        snapshot: DerivedStateSnapshot,
    ) -> Result<DecisionReport, DecisionServiceError> {
        let decision = self.engine.decide(&snapshot);
        info!(
            outcome = %decision.outcome,
            confidence = decision.confidence,
            policy_version = %decision.policy_version,
            reasons = decision.reasons.len(),
            "decision made"
        );

        let record = self.repository.save(decision, snapshot).map_err(|err| {
            error!(%err, "failed to record decision");
            err
        })?;

        let escalation = if record.decision.outcome.requires_escalation() {
            match self.escalations.publish(&Escalation::from(&record)) {
                Ok(()) => EscalationStatus::Delivered,
                Err(err) => {
                    warn!(decision_id = %record.id.0, %err, "escalation not delivered");
                    EscalationStatus::Failed(err.to_string())
                }
            }
        } else {
            EscalationStatus::NotRequired
        };

        Ok(DecisionReport { record, escalation })
    }

    pub fn latest(&self) -> Result<Option<DecisionRecord>, DecisionServiceError> {
        Ok(self.repository.latest()?)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<DecisionRecord>, DecisionServiceError> {
        Ok(self.repository.recent(limit)?)
    }
}

/// Error raised by the decision service.
#[derive(Debug, thiserror::Error)]
pub enum DecisionServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
