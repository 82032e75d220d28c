pub mod batch;
pub mod coordinator;
pub mod error;
pub mod submitter;

pub use batch::{Batch, BatchConfig, DEFAULT_MAX_BATCH_AGE, DEFAULT_MAX_BATCH_SIZE, FlushTrigger};
pub use coordinator::BatchCoordinator;
pub use error::SubmitError;
pub use submitter::LogSubmitter;
