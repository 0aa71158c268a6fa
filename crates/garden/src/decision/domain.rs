use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::readings::SensorType;
use crate::state::{DerivedStateSnapshot, HumidityLevel, SoilMoistureLevel, TemperatureLevel};
use crate::tags::string_tagged;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    NoAction,
    Escalate,
    Alert,
}

string_tagged!(DecisionOutcome, "decision outcome", {
    NoAction => "no_action",
    Escalate => "escalate",
    Alert => "alert",
});

impl DecisionOutcome {
    /// Whether the escalation consumer must hear about this outcome.
    pub const fn requires_escalation(self) -> bool {
        !matches!(self, DecisionOutcome::NoAction)
    }
}

/// Why a decision came out the way it did, kept for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionReason {
    MissingDomain {
        domain: SensorType,
    },
    LowConfidence {
        domain: SensorType,
        confidence: f64,
        floor: f64,
    },
    EmptyWindow {
        domain: SensorType,
    },
    TemperatureOutOfRange {
        level: TemperatureLevel,
    },
    HumidityOutOfRange {
        level: HumidityLevel,
    },
    SoilMoistureOutOfRange {
        level: SoilMoistureLevel,
    },
}

impl DecisionReason {
    pub fn summary(&self) -> String {
        match self {
            DecisionReason::MissingDomain { domain } => {
                format!("no {domain} readings in the evidence window")
            }
            DecisionReason::LowConfidence {
                domain,
                confidence,
                floor,
            } => format!("{domain} confidence {confidence:.2} below floor {floor:.2}"),
            DecisionReason::EmptyWindow { domain } => {
                format!("{domain} state reports an empty sample window")
            }
            DecisionReason::TemperatureOutOfRange { level } => {
                format!("temperature {level}")
            }
            DecisionReason::HumidityOutOfRange { level } => format!("humidity {level}"),
            DecisionReason::SoilMoistureOutOfRange { level } => {
                format!("soil moisture {level}")
            }
        }
    }
}

/// Append-only decision log entry; one per evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub outcome: DecisionOutcome,
    pub confidence: f64,
    pub policy_version: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub reasons: Vec<DecisionReason>,
}

impl Decision {
    pub fn summary(&self) -> String {
        let head = format!(
            "{} (confidence {:.2}, policy {})",
            self.outcome, self.confidence, self.policy_version
        );
        if self.reasons.is_empty() {
            return head;
        }

        let reasons: Vec<String> = self.reasons.iter().map(DecisionReason::summary).collect();
        format!("{head}: {}", reasons.join("; "))
    }
}

/// Identifier assigned by the decision repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionId(pub String);

/// A persisted decision together with the snapshot that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: DecisionId,
    pub decision: Decision,
    pub snapshot: DerivedStateSnapshot,
}
