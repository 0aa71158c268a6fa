//! Classifies a derived-state snapshot into an outcome and records it.

mod domain;
mod engine;
pub mod repository;
mod service;

#[cfg(test)]
mod tests;

pub use domain::{Decision, DecisionId, DecisionOutcome, DecisionReason, DecisionRecord};
pub use engine::{aggregate_confidence, DecisionEngine, CONFIDENCE_FLOOR};
pub use repository::{
    DecisionRepository, Escalation, EscalationError, EscalationPublisher, RepositoryError,
};
pub use service::{DecisionReport, DecisionService, DecisionServiceError, EscalationStatus};
