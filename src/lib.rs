#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Safe within realistic value bounds (durations, sizes)
    clippy::cast_possible_wrap,       // Unix seconds fit comfortably in i128
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. SubmitError in buffer module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod buffer;
pub mod domain;
pub mod sender;

// Re-export main types for easy access
pub use app::{EngineConfig, Forwarder, ForwarderBuilder};
pub use buffer::{LogSubmitter, SubmitError};
pub use domain::{ForwarderError, LogRecord};
pub use sender::{FailedDelivery, FailureHandler, TimestampPrecision};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
