use super::config::{LogFormat, LogLevel};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// HTTP internals are noisy at debug level; keep them quiet unless asked.
const DEFAULT_DIRECTIVES: &[(&str, LogLevel)] = &[
    ("hyper", LogLevel::Warn),
    ("hyper_util", LogLevel::Warn),
    ("reqwest", LogLevel::Warn),
    ("h2", LogLevel::Warn),
    ("rustls", LogLevel::Warn),
];

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum InitializationError {
    #[error("Logging system initialization failed: {details}")]
    LoggingInitFailed {
        details: String,
        #[source]
        source: BoxedError,
    },
}

pub fn build_filter_string(default_level: LogLevel) -> String {
    let mut filter_parts = Vec::with_capacity(DEFAULT_DIRECTIVES.len() + 1);
    filter_parts.push(default_level.as_str().to_string());
    for (target, level) in DEFAULT_DIRECTIVES {
        filter_parts.push(format!("{}={}", target, level.as_str()));
    }
    filter_parts.join(",")
}

fn build_env_filter(level: LogLevel) -> Result<EnvFilter, InitializationError> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(_) => EnvFilter::try_from_default_env().map_err(BoxedError::from),
        Err(_) => EnvFilter::try_new(build_filter_string(level)).map_err(BoxedError::from),
    };

    filter.map_err(|source| InitializationError::LoggingInitFailed {
        details: "Failed to create EnvFilter".to_string(),
        source,
    })
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn setup_logging(level: LogLevel, format: LogFormat) -> Result<(), InitializationError> {
    let env_filter = build_env_filter(level)?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| InitializationError::LoggingInitFailed {
        details: "Failed to set global tracing subscriber".to_string(),
        source: Box::new(e),
    })
}
