use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Forwarder is shut down")]
    Closed,
}
