use super::SubmitError;
use crate::domain::LogRecord;
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};

/// Capacity of the hand-off channel. One slot keeps producers in lock-step with
/// the coordinator.
pub(crate) const HANDOFF_CAPACITY: usize = 1;

/// A record in transit to the coordinator, with the acknowledgement the
/// coordinator sends once the record is in its queue.
#[derive(Debug)]
pub(crate) struct Submission {
    pub(crate) record: LogRecord,
    pub(crate) ack: oneshot::Sender<()>,
}

/// Cloneable producer handle. Every clone feeds the same coordinator.
#[derive(Debug, Clone)]
pub struct LogSubmitter {
    tx: mpsc::Sender<Submission>,
}

impl LogSubmitter {
    pub(crate) fn new(tx: mpsc::Sender<Submission>) -> Self {
        Self { tx }
    }

    /// Stamps the record and waits until the coordinator has queued it.
    pub async fn submit(&self, mut record: LogRecord) -> Result<(), SubmitError> {
        record.stamp(Utc::now());
        let (ack, accepted) = oneshot::channel();

        self.tx
            .send(Submission { record, ack })
            .await
            .map_err(|_| SubmitError::Closed)?;
        accepted.await.map_err(|_| SubmitError::Closed)
    }

    /// Same as [`submit`](Self::submit) for producers on plain threads.
    ///
    /// Panics if called from inside an async execution context.
    pub fn submit_blocking(&self, mut record: LogRecord) -> Result<(), SubmitError> {
        record.stamp(Utc::now());
        let (ack, accepted) = oneshot::channel();

        self.tx
            .blocking_send(Submission { record, ack })
            .map_err(|_| SubmitError::Closed)?;
        accepted.blocking_recv().map_err(|_| SubmitError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
