pub mod config;
pub mod engine_config;
pub mod logging_system;
pub mod service;
pub mod shutdown;

pub use config::{Config, ConfigError, LogFormat, LogLevel};
pub use engine_config::{EngineConfig, EngineConfigError};
pub use logging_system::{InitializationError, setup_logging};
pub use service::{Forwarder, ForwarderBuilder};

use crate::buffer::{LogSubmitter, SubmitError};
use crate::domain::LogRecord;
use std::borrow::Cow;
use std::process;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

pub struct App {
    config: Config,
}

impl App {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_config(Config::from_args(args)?))
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Forwards stdin until EOF or a termination signal, then drains.
    pub async fn run(self) -> anyhow::Result<()> {
        let metadata = self.config.static_metadata()?;
        let forwarder = Forwarder::start(self.config.engine_config())?;

        info!("Starting rask-loki-forwarder v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "Configuration: endpoint={:?}, labels={:?}, batch_size={}, max_batch_age_ms={}",
            self.config.endpoint,
            self.config.labels,
            self.config.batch_size,
            self.config.max_batch_age_ms
        );

        let stdin = BufReader::new(tokio::io::stdin());
        let submitter = forwarder.submitter();

        let forwarded = tokio::select! {
            result = forward_lines(stdin, &submitter, &metadata) => result.map(Some),
            () = shutdown::wait_for_signal() => Ok(None),
        };

        // Pending records are flushed even when reading failed.
        forwarder.stop().await?;
        match forwarded? {
            Some(count) => info!("Reached end of input after {} lines", count),
            None => info!("Stopped by signal"),
        }
        info!("rask-loki-forwarder stopped.");
        Ok(())
    }
}

/// Submits every line of `reader` as one record carrying `metadata`.
///
/// Lines are treated as opaque bytes; invalid UTF-8 is replaced rather than
/// rejected. A trailing `\n` or `\r\n` is stripped.
pub async fn forward_lines<R>(
    mut reader: R,
    submitter: &LogSubmitter,
    metadata: &[(String, String)],
) -> Result<usize, ForwardError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = trim_line_ending(&buf);
        let raw_line = match String::from_utf8_lossy(line) {
            Cow::Borrowed(text) => text.to_string(),
            Cow::Owned(text) => {
                warn!("Line {} is not valid UTF-8; invalid bytes replaced", count + 1);
                text
            }
        };

        let mut record = LogRecord::new(raw_line);
        for (key, value) in metadata {
            record.insert_metadata(key.clone(), value.clone());
        }
        submitter.submit(record).await?;
        count += 1;
        debug!("Submitted line {}", count);
    }

    Ok(count)
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[derive(thiserror::Error, Debug)]
pub enum ForwardError {
    #[error("Failed to read input: {0}")]
    Read(#[from] std::io::Error),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

// Main entry point for the application
pub async fn main() -> anyhow::Result<()> {
    let app = match App::from_args(std::env::args_os()) {
        Ok(app) => app,
        Err(ConfigError::Cli(e)) => e.exit(),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(2);
        }
    };

    if let Err(e) = setup_logging(app.config().log_level, app.config().log_format) {
        eprintln!("Warning: {e}");
    }

    if let Err(e) = app.run().await {
        error!("Application error: {:#}", e);
        process::exit(1);
    }

    Ok(())
}
