use crate::buffer::Batch;
use crate::domain::LogRecord;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

const NANOS_PER_SECOND: i128 = 1_000_000_000;
const ESTIMATED_STREAM_SIZE: usize = 256; // bytes per stream entry

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Batch is empty")]
    EmptyBatch,
}

/// Resolution of the nanosecond timestamp written on each sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPrecision {
    /// Whole seconds scaled to nanoseconds (always a multiple of 1e9)
    #[default]
    Seconds,
    /// Full sub-second precision as captured at submission
    Nanoseconds,
}

impl TimestampPrecision {
    pub fn render(self, timestamp: DateTime<Utc>) -> String {
        let seconds = timestamp.timestamp() as i128 * NANOS_PER_SECOND;
        let nanos = match self {
            TimestampPrecision::Seconds => seconds,
            TimestampPrecision::Nanoseconds => {
                seconds + timestamp.timestamp_subsec_nanos() as i128
            }
        };
        nanos.to_string()
    }
}

#[derive(Serialize)]
struct PushRequest<'a> {
    streams: Vec<StreamEntry<'a>>,
}

#[derive(Serialize)]
struct StreamEntry<'a> {
    stream: BTreeMap<&'a str, &'a str>,
    values: Vec<Sample<'a>>,
}

/// `[timestamp, line, metadata]`, serialized as a JSON array.
#[derive(Serialize)]
struct Sample<'a>(String, &'a str, BTreeMap<&'a str, &'a str>);

/// Encodes batches into the Loki push format.
///
/// Every record becomes its own stream entry, even when its labels match another
/// record's. Label extraction reads from the record without modifying it, so the
/// same batch always encodes to the same bytes.
#[derive(Debug, Clone)]
pub struct LokiSerializer {
    labels: BTreeSet<String>,
    precision: TimestampPrecision,
}

impl LokiSerializer {
    pub fn new<I, S>(labels: I, precision: TimestampPrecision) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            precision,
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn serialize_batch(&self, batch: &Batch) -> Result<Bytes, SerializationError> {
        self.serialize_records(batch.records())
    }

    pub fn serialize_records(&self, records: &[LogRecord]) -> Result<Bytes, SerializationError> {
        if records.is_empty() {
            return Err(SerializationError::EmptyBatch);
        }

        let request = PushRequest {
            streams: records.iter().map(|record| self.stream_entry(record)).collect(),
        };

        let mut buffer = Vec::with_capacity(records.len().saturating_mul(ESTIMATED_STREAM_SIZE));
        serde_json::to_writer(&mut buffer, &request)?;
        Ok(Bytes::from(buffer))
    }

    fn stream_entry<'a>(&'a self, record: &'a LogRecord) -> StreamEntry<'a> {
        let stream = self
            .labels
            .iter()
            .map(|label| {
                let value = record.metadata().get(label).map_or("", String::as_str);
                (label.as_str(), value)
            })
            .collect();

        let remaining = record
            .metadata()
            .iter()
            .filter(|(key, _)| !self.labels.contains(key.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();

        let timestamp = record.timestamp().unwrap_or(DateTime::UNIX_EPOCH);

        StreamEntry {
            stream,
            values: vec![Sample(
                self.precision.render(timestamp),
                record.raw_line(),
                remaining,
            )],
        }
    }
}
