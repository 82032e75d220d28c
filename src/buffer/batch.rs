use crate::domain::LogRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;
pub const DEFAULT_MAX_BATCH_AGE: Duration = Duration::from_secs(10);

/// Which of the flush conditions produced a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlushTrigger {
    SizeBased,
    AgeBased,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub max_size: usize,
    pub max_age: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_BATCH_SIZE,
            max_age: DEFAULT_MAX_BATCH_AGE,
        }
    }
}

impl BatchConfig {
    /// Zero thresholds mean "unset" and fall back to the defaults.
    pub fn with_defaults(self) -> Self {
        Self {
            max_size: if self.max_size == 0 {
                DEFAULT_MAX_BATCH_SIZE
            } else {
                self.max_size
            },
            max_age: if self.max_age.is_zero() {
                DEFAULT_MAX_BATCH_AGE
            } else {
                self.max_age
            },
        }
    }
}

/// The unit that is encoded and delivered in one request.
#[derive(Debug, Clone)]
pub struct Batch {
    id: String,
    records: Vec<LogRecord>,
    trigger: FlushTrigger,
}

impl Batch {
    pub fn new(records: Vec<LogRecord>, trigger: FlushTrigger) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            records,
            trigger,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn trigger(&self) -> FlushTrigger {
        self.trigger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_thresholds_fall_back_to_defaults() {
        let config = BatchConfig {
            max_size: 0,
            max_age: Duration::ZERO,
        }
        .with_defaults();

        assert_eq!(config.max_size, 100);
        assert_eq!(config.max_age, Duration::from_secs(10));
    }

    #[test]
    fn test_explicit_thresholds_are_kept() {
        let config = BatchConfig {
            max_size: 7,
            max_age: Duration::from_millis(250),
        }
        .with_defaults();

        assert_eq!(config.max_size, 7);
        assert_eq!(config.max_age, Duration::from_millis(250));
    }

    #[test]
    fn test_batches_get_distinct_ids() {
        let a = Batch::new(vec![LogRecord::new("a")], FlushTrigger::SizeBased);
        let b = Batch::new(vec![LogRecord::new("b")], FlushTrigger::AgeBased);

        assert_ne!(a.id(), b.id());
        assert_eq!(a.size(), 1);
        assert_eq!(b.trigger(), FlushTrigger::AgeBased);
    }
}
