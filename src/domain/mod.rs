//! Domain layer for rask-loki-forwarder.
//!
//! Contains the canonical types shared across all modules:
//! - `LogRecord`: one log line plus producer metadata
//! - `ForwarderError`: Top-level error type

pub mod error;
pub mod log_record;

pub use error::ForwarderError;
pub use log_record::LogRecord;
