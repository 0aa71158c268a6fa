//! Evidence windows and the sample-sufficiency confidence score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::readings::{ParsedReading, Reading};

/// Time span and sample count backing a derived state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceWindow {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub sample_count: usize,
}

/// Anything carrying a creation instant.
pub trait Timestamped {
    fn created(&self) -> DateTime<Utc>;
}

impl Timestamped for Reading {
    fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

impl<P> Timestamped for ParsedReading<P> {
    fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvidenceError {
    #[error("cannot build an evidence window from zero readings")]
    Empty,
    #[error("readings are not in ascending created order at position {index}")]
    OutOfOrder { index: usize },
}

impl EvidenceWindow {
    /// Window spanning the first to the last of `readings`, which must be
    /// non-empty and ascending by `created`.
    pub fn from_readings<T: Timestamped>(readings: &[T]) -> Result<Self, EvidenceError> {
        let (Some(first), Some(last)) = (readings.first(), readings.last()) else {
            return Err(EvidenceError::Empty);
        };

        if let Some(index) = readings
            .windows(2)
            .position(|pair| pair[1].created() < pair[0].created())
        {
            return Err(EvidenceError::OutOfOrder { index: index + 1 });
        }

        Ok(Self {
            window_start: first.created(),
            window_end: last.created(),
            sample_count: readings.len(),
        })
    }

    pub fn span(&self) -> chrono::Duration {
        self.window_end - self.window_start
    }
}

/// Ratio of samples obtained to samples required, saturating at 1.0.
///
/// This measures sufficiency, not probability: more data than `min_samples`
/// never lowers the score.
pub fn confidence_score(sample_count: usize, min_samples: usize) -> f64 {
    // Unreachable with validated policies, which require `min_samples >= 1`.
    if min_samples == 0 {
        return 1.0;
    }
    (sample_count as f64 / min_samples as f64).min(1.0)
}
