use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One log line plus the metadata a producer attached to it.
///
/// The raw line is opaque; nothing in the pipeline parses it. The timestamp is
/// assigned once when the record is submitted, after which the record belongs to
/// the batch coordinator and is never modified again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    raw_line: String,
    timestamp: Option<DateTime<Utc>>,
    metadata: HashMap<String, String>,
}

impl LogRecord {
    pub fn new(raw_line: impl Into<String>) -> Self {
        Self {
            raw_line: raw_line.into(),
            timestamp: None,
            metadata: HashMap::new(),
        }
    }

    /// Builder-style metadata insertion.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Pins the timestamp ahead of encoding. Submission overwrites it.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn metadata_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.metadata
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn raw_line(&self) -> &str {
        &self.raw_line
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub(crate) fn stamp(&mut self, now: DateTime<Utc>) {
        self.timestamp = Some(now);
    }
}
