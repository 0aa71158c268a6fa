use chrono::{DateTime, Utc};

use super::domain::{Reading, SensorType};

/// Read side of the reading storage, so derivation can run against any backend.
pub trait ReadingStore: Send + Sync {
    /// Readings for one sensor with `created` inside `[window_start, window_end]`,
    /// ascending by `created`.
    fn fetch(
        &self,
        sensor_type: SensorType,
        sensor_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError>;

    fn fetch_latest(
        &self,
        sensor_type: SensorType,
        sensor_id: &str,
    ) -> Result<Option<Reading>, StoreError>;
}

/// Error enumeration for reading store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("reading store unavailable: {0}")]
    Unavailable(String),
}
