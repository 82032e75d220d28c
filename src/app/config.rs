use super::EngineConfig;
use crate::sender::TimestampPrecision;
use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_MAX_BATCH_AGE_MS: u64 = 10_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing endpoint: set --endpoint, LOKI_ENDPOINT or `endpoint` in the config file")]
    MissingEndpoint,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Cli(#[from] clap::Error),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Output format of the forwarder's own diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Parser, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[command(author, version, about = "Ship lines from stdin to a Loki push endpoint", long_about = None)]
#[serde(default)]
pub struct Config {
    /// Loki push endpoint URL
    #[arg(long, env = "LOKI_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Metadata keys promoted to stream labels (comma separated)
    #[arg(long = "label", env = "LOKI_LABELS", value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Static `key=value` metadata attached to every line (comma separated)
    #[arg(long = "metadata", env = "LOKI_METADATA", value_delimiter = ',')]
    pub metadata: Vec<String>,

    /// Number of records per batch
    #[arg(long, env = "LOKI_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Maximum time between flushes in milliseconds
    #[arg(long, env = "LOKI_MAX_BATCH_AGE_MS", default_value_t = DEFAULT_MAX_BATCH_AGE_MS)]
    pub max_batch_age_ms: u64,

    /// Per-request timeout in seconds (unset: wait indefinitely)
    #[arg(long, env = "LOKI_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Gzip request bodies (`--compression=false` turns it off again)
    #[arg(
        long,
        env = "LOKI_COMPRESSION",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub compression: bool,

    /// Timestamp resolution written to Loki
    #[arg(long, env = "LOKI_TIMESTAMP_PRECISION", default_value = "seconds")]
    pub timestamp_precision: TimestampPrecision,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            labels: Vec::new(),
            metadata: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_batch_age_ms: DEFAULT_MAX_BATCH_AGE_MS,
            request_timeout_secs: None,
            compression: false,
            timestamp_precision: TimestampPrecision::Seconds,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            config_file: None,
        }
    }
}

impl Config {
    /// Parses CLI arguments (and their env fallbacks), layered over the config
    /// file when one is given. Explicit arguments win over the file.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Config::command().try_get_matches_from(args)?;
        let cli = Config::from_arg_matches(&matches)?;

        let config = match &cli.config_file {
            Some(path) => Self::read_file(path)?.overridden_by(cli, &matches),
            None => cli,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Config = toml::from_str(&content)?;
        config.config_file = Some(path.as_ref().to_path_buf());
        Ok(config)
    }

    /// Applies every value the user set on the command line or through the
    /// environment. Clap defaults never replace file values.
    fn overridden_by(mut self, cli: Config, matches: &ArgMatches) -> Self {
        let explicit = |id: &str| {
            matches!(
                matches.value_source(id),
                Some(ValueSource::CommandLine | ValueSource::EnvVariable)
            )
        };

        if explicit("endpoint") {
            self.endpoint = cli.endpoint;
        }
        if explicit("labels") {
            self.labels = cli.labels;
        }
        if explicit("metadata") {
            self.metadata = cli.metadata;
        }
        if explicit("batch_size") {
            self.batch_size = cli.batch_size;
        }
        if explicit("max_batch_age_ms") {
            self.max_batch_age_ms = cli.max_batch_age_ms;
        }
        if explicit("request_timeout_secs") {
            self.request_timeout_secs = cli.request_timeout_secs;
        }
        if explicit("compression") {
            self.compression = cli.compression;
        }
        if explicit("timestamp_precision") {
            self.timestamp_precision = cli.timestamp_precision;
        }
        if explicit("log_level") {
            self.log_level = cli.log_level;
        }
        if explicit("log_format") {
            self.log_format = cli.log_format;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or(ConfigError::MissingEndpoint)?;

        Url::parse(endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{endpoint}': {e}"))
        })?;

        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(label) = self.labels.iter().find(|label| label.trim().is_empty()) {
            return Err(ConfigError::InvalidConfig(format!(
                "Label names must not be empty: {label:?}"
            )));
        }

        self.static_metadata()?;
        Ok(())
    }

    /// Splits the `key=value` metadata arguments.
    pub fn static_metadata(&self) -> Result<Vec<(String, String)>, ConfigError> {
        self.metadata
            .iter()
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    Ok((key.trim().to_string(), value.to_string()))
                }
                _ => Err(ConfigError::InvalidConfig(format!(
                    "Metadata must be key=value, got '{pair}'"
                ))),
            })
            .collect()
    }

    pub fn engine_config(&self) -> EngineConfig {
        let mut engine = EngineConfig::new(self.endpoint.clone().unwrap_or_default())
            .with_labels(self.labels.iter().map(|label| label.trim().to_string()))
            .with_max_batch_size(self.batch_size)
            .with_max_batch_age(Duration::from_millis(self.max_batch_age_ms))
            .with_compression(self.compression)
            .with_timestamp_precision(self.timestamp_precision);

        if let Some(secs) = self.request_timeout_secs {
            engine = engine.with_request_timeout(Duration::from_secs(secs));
        }
        engine
    }
}
