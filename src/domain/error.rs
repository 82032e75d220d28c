use thiserror::Error;

/// Top-level error type for the forwarder.
#[derive(Error, Debug)]
pub enum ForwarderError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::app::EngineConfigError),

    #[error("HTTP client initialization failed: {0}")]
    Client(#[from] crate::sender::DeliveryError),

    #[error("Submission error: {0}")]
    Submit(#[from] crate::buffer::SubmitError),

    #[error("Shutdown error: {0}")]
    Shutdown(String),
}
