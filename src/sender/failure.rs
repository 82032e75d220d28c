use super::DeliveryError;
use crate::buffer::FlushTrigger;
use bytes::Bytes;

#[cfg(test)]
use mockall::automock;

/// A batch that could not be delivered and has left the engine.
#[derive(Debug)]
pub struct FailedDelivery {
    pub batch_id: String,
    pub record_count: usize,
    pub trigger: FlushTrigger,
    pub payload: Bytes,
    pub error: DeliveryError,
}

/// Hook for callers that want to react to dropped batches, e.g. with their own
/// retry queue. Runs inline on the coordinator task, so implementations must hand
/// work off rather than block.
#[cfg_attr(test, automock)]
pub trait FailureHandler: Send + Sync {
    fn handle(&self, failure: FailedDelivery);
}

impl<F> FailureHandler for F
where
    F: Fn(FailedDelivery) + Send + Sync,
{
    fn handle(&self, failure: FailedDelivery) {
        self(failure);
    }
}
