use serde::{Deserialize, Serialize};

use super::domain::{Decision, DecisionId, DecisionOutcome, DecisionReason, DecisionRecord};
use crate::state::DerivedStateSnapshot;

/// Storage abstraction for the append-only decision log.
pub trait DecisionRepository: Send + Sync {
    /// Persist a decision with the snapshot that produced it.
    fn save(
        &self,
        decision: Decision,
        snapshot: DerivedStateSnapshot,
    ) -> Result<DecisionRecord, RepositoryError>;
    fn latest(&self) -> Result<Option<DecisionRecord>, RepositoryError>;
    /// Newest first.
    fn recent(&self, limit: usize) -> Result<Vec<DecisionRecord>, RepositoryError>;
}

/// Error enumeration for decision log failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("failed to persist decision: {0}")]
    Write(String),
    #[error("decision log unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for outcomes that need attention (alert channel, reasoning step).
pub trait EscalationPublisher: Send + Sync {
    fn publish(&self, escalation: &Escalation) -> Result<(), EscalationError>;
}

/// What the escalation consumer receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    pub decision_id: DecisionId,
    pub outcome: DecisionOutcome,
    pub confidence: f64,
    pub policy_version: String,
    pub reasons: Vec<DecisionReason>,
    pub snapshot: DerivedStateSnapshot,
}

impl From<&DecisionRecord> for Escalation {
    fn from(record: &DecisionRecord) -> Self {
        Self {
            decision_id: record.id.clone(),
            outcome: record.decision.outcome,
            confidence: record.decision.confidence,
            policy_version: record.decision.policy_version.clone(),
            reasons: record.decision.reasons.clone(),
            snapshot: record.snapshot.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EscalationError {
    #[error("escalation transport unavailable: {0}")]
    Transport(String),
}
