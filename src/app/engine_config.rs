use crate::buffer::{BatchConfig, DEFAULT_MAX_BATCH_AGE, DEFAULT_MAX_BATCH_SIZE};
use crate::sender::{ClientConfig, TimestampPrecision};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineConfigError {
    #[error("No endpoint URL specified")]
    MissingEndpoint,
    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

/// Settings for one running forwarder.
///
/// Zero for `max_batch_size` or `max_batch_age` means "use the default".
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub endpoint: String,
    /// Metadata keys promoted to stream labels.
    pub labels: Vec<String>,
    pub max_batch_size: usize,
    pub max_batch_age: Duration,
    pub request_timeout: Option<Duration>,
    pub compression: bool,
    pub timestamp_precision: TimestampPrecision,
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            labels: Vec::new(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_batch_age: DEFAULT_MAX_BATCH_AGE,
            request_timeout: None,
            compression: false,
            timestamp_precision: TimestampPrecision::Seconds,
            user_agent: format!("rask-loki-forwarder/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl EngineConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn with_max_batch_age(mut self, max_batch_age: Duration) -> Self {
        self.max_batch_age = max_batch_age;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_compression(mut self, compression: bool) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_timestamp_precision(mut self, precision: TimestampPrecision) -> Self {
        self.timestamp_precision = precision;
        self
    }

    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(EngineConfigError::MissingEndpoint);
        }

        let url = Url::parse(&self.endpoint).map_err(|e| EngineConfigError::InvalidEndpoint {
            url: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(EngineConfigError::InvalidEndpoint {
                url: self.endpoint.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(())
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            max_size: self.max_batch_size,
            max_age: self.max_batch_age,
        }
        .with_defaults()
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            timeout: self.request_timeout,
            user_agent: self.user_agent.clone(),
            enable_compression: self.compression,
        }
    }
}
