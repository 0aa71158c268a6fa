use super::domain::{Decision, DecisionOutcome, DecisionReason};
use crate::readings::SensorType;
use crate::state::{DerivedStateSnapshot, HumidityLevel, SoilMoistureLevel, TemperatureLevel};

/// Below this confidence a domain's state is not trusted at all.
pub const CONFIDENCE_FLOOR: f64 = 0.5;

/// Stateless classifier. An unusable snapshot always alerts, whatever its
/// levels say.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    policy_version: String,
}

impl DecisionEngine {
    pub fn new(policy_version: impl Into<String>) -> Self {
        Self {
            policy_version: policy_version.into(),
        }
    }

    /// Classify `snapshot`. The decision is stamped with the snapshot's instant.
    pub fn decide(&self, snapshot: &DerivedStateSnapshot) -> Decision {
        let invalid = validity_issues(snapshot);
        if !invalid.is_empty() {
            return self.decision(snapshot, DecisionOutcome::Alert, 0.0, invalid);
        }

        let confidence = aggregate_confidence(snapshot);
        let violations = policy_violations(snapshot);
        let outcome = if violations.is_empty() {
            DecisionOutcome::NoAction
        } else {
            DecisionOutcome::Escalate
        };

        self.decision(snapshot, outcome, confidence, violations)
    }

    fn decision(
        &self,
        snapshot: &DerivedStateSnapshot,
        outcome: DecisionOutcome,
        confidence: f64,
        reasons: Vec<DecisionReason>,
    ) -> Decision {
        Decision {
            outcome,
            confidence,
            policy_version: self.policy_version.clone(),
            created: snapshot.created,
            reasons,
        }
    }
}

/// Everything that makes the snapshot unusable. Empty means valid.
fn validity_issues(snapshot: &DerivedStateSnapshot) -> Vec<DecisionReason> {
    let mut issues = Vec::new();

    for domain in SensorType::ALL {
        let Some(summary) = snapshot.summary(domain) else {
            issues.push(DecisionReason::MissingDomain { domain });
            continue;
        };

        if summary.confidence.is_nan() || summary.confidence < CONFIDENCE_FLOOR {
            issues.push(DecisionReason::LowConfidence {
                domain,
                confidence: summary.confidence,
                floor: CONFIDENCE_FLOOR,
            });
        }
        if summary.sample_count == 0 {
            issues.push(DecisionReason::EmptyWindow { domain });
        }
    }

    issues
}

fn policy_violations(snapshot: &DerivedStateSnapshot) -> Vec<DecisionReason> {
    let mut violations = Vec::new();

    if let Some(climate) = &snapshot.climate {
        if climate.temperature_level != TemperatureLevel::Ok {
            violations.push(DecisionReason::TemperatureOutOfRange {
                level: climate.temperature_level,
            });
        }
        if climate.humidity_level != HumidityLevel::Ok {
            violations.push(DecisionReason::HumidityOutOfRange {
                level: climate.humidity_level,
            });
        }
    }

    if let Some(soil) = &snapshot.soil_moisture {
        if soil.level != SoilMoistureLevel::Ok {
            violations.push(DecisionReason::SoilMoistureOutOfRange { level: soil.level });
        }
    }

    violations
}

/// Minimum confidence across present domains; 0.0 when none are present.
pub fn aggregate_confidence(snapshot: &DerivedStateSnapshot) -> f64 {
    snapshot
        .summaries()
        .into_iter()
        .map(|summary| summary.confidence)
        .reduce(f64::min)
        .unwrap_or(0.0)
}
