use chrono::{DateTime, Utc};

use super::evidence::EvidenceError;
use crate::readings::{SensorType, StoreError};

/// Failures while deriving state. Insufficient evidence is not one of them: it
/// shows up as low confidence instead.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("{domain} state service received 0 sensor readings")]
    NoReadings { domain: SensorType },
    #[error("invalid {domain} payload from sensor {sensor_id} at {created}: {source}")]
    InvalidPayload {
        domain: SensorType,
        sensor_id: String,
        created: DateTime<Utc>,
        #[source]
        source: serde_json::Error,
    },
    #[error("{domain} state service was handed a {found} reading from sensor {sensor_id}")]
    UnexpectedSensorType {
        domain: SensorType,
        found: SensorType,
        sensor_id: String,
    },
    #[error("{domain} evidence window rejected: {source}")]
    Evidence {
        domain: SensorType,
        #[source]
        source: EvidenceError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}
