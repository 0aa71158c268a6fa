//! CSV import of recorded readings, used to replay a sensor log offline.
//!
//! Expected header: `created,sensor_type,sensor_id,payload`, where `payload`
//! holds the reading's JSON object.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::domain::{Reading, SensorType};
use crate::tags::UnknownTag;

#[derive(Debug, thiserror::Error)]
pub enum ReadingImportError {
    #[error("failed to read readings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid readings CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unrecognised timestamp '{value}'")]
    Timestamp { row: usize, value: String },
    #[error("row {row}: {source}")]
    SensorType {
        row: usize,
        #[source]
        source: UnknownTag,
    },
    #[error("row {row}: invalid payload ({detail})")]
    Payload { row: usize, detail: String },
}

#[derive(Debug, Deserialize)]
struct ReadingRow {
    created: String,
    sensor_type: String,
    sensor_id: String,
    payload: String,
}

pub fn from_path(path: impl AsRef<Path>) -> Result<Vec<Reading>, ReadingImportError> {
    let file = File::open(path)?;
    parse_readings(file)
}

/// Parse readings from CSV, returned in ascending `created` order.
pub fn parse_readings<R: Read>(reader: R) -> Result<Vec<Reading>, ReadingImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut readings = Vec::new();

    for (index, record) in csv_reader.deserialize::<ReadingRow>().enumerate() {
        let row = index + 1;
        let record = record?;

        let created =
            parse_timestamp(&record.created).ok_or_else(|| ReadingImportError::Timestamp {
                row,
                value: record.created.clone(),
            })?;
        let sensor_type = record
            .sensor_type
            .parse::<SensorType>()
            .map_err(|source| ReadingImportError::SensorType { row, source })?;
        let payload = match serde_json::from_str::<Value>(&record.payload) {
            Ok(value @ Value::Object(_)) => value,
            Ok(other) => {
                return Err(ReadingImportError::Payload {
                    row,
                    detail: format!("expected a JSON object, found {other}"),
                })
            }
            Err(err) => {
                return Err(ReadingImportError::Payload {
                    row,
                    detail: err.to_string(),
                })
            }
        };

        readings.push(Reading::new(created, sensor_type, record.sensor_id, payload));
    }

    readings.sort_by_key(|reading| reading.created);
    Ok(readings)
}

/// Accepts RFC 3339, a naive `YYYY-MM-DD HH:MM:SS` (taken as UTC), or a bare date.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
