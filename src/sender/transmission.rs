use super::failure::{FailedDelivery, FailureHandler};
use super::metrics::MetricsCollector;
use super::serialization::LokiSerializer;
use super::{Deliver, DeliveryError, DeliveryReport};
use crate::buffer::Batch;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug)]
pub enum TransmissionOutcome {
    Delivered(DeliveryReport),
    Dropped,
}

impl TransmissionOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, TransmissionOutcome::Delivered(_))
    }
}

/// Encodes a batch, delivers it once, and accounts for the result.
///
/// Failures never propagate: a batch that cannot be encoded or delivered is
/// logged, counted as dropped and handed to the failure handler.
pub struct BatchTransmitter<D> {
    delivery: D,
    serializer: LokiSerializer,
    metrics: MetricsCollector,
    failure_handler: Option<Arc<dyn FailureHandler>>,
}

impl<D: Deliver> BatchTransmitter<D> {
    pub fn new(
        delivery: D,
        serializer: LokiSerializer,
        metrics: MetricsCollector,
        failure_handler: Option<Arc<dyn FailureHandler>>,
    ) -> Self {
        Self {
            delivery,
            serializer,
            metrics,
            failure_handler,
        }
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub async fn send_batch(&self, batch: Batch) -> TransmissionOutcome {
        let batch_id = batch.id().to_string();
        let record_count = batch.size();
        let trigger = batch.trigger();

        self.metrics.record_flush(trigger);
        info!(
            "Flushing batch {} ({} records, trigger: {:?})",
            batch_id, record_count, trigger
        );

        let payload = match self.serializer.serialize_batch(&batch) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode batch {}: {}; dropping {} records", batch_id, e, record_count);
                self.metrics.record_dropped(record_count);
                return TransmissionOutcome::Dropped;
            }
        };
        drop(batch);

        match self.delivery.deliver(payload.clone()).await {
            Ok(report) => {
                self.metrics
                    .record_delivered(record_count, report.bytes_sent, report.latency);
                info!(
                    "Delivered batch {} ({} records, {} bytes) in {:?}",
                    batch_id, record_count, report.bytes_sent, report.latency
                );
                TransmissionOutcome::Delivered(report)
            }
            Err(error) => {
                self.metrics.record_dropped(record_count);
                log_drop(&batch_id, record_count, &error);

                if let Some(handler) = &self.failure_handler {
                    handler.handle(FailedDelivery {
                        batch_id,
                        record_count,
                        trigger,
                        payload,
                        error,
                    });
                }
                TransmissionOutcome::Dropped
            }
        }
    }
}

fn log_drop(batch_id: &str, record_count: usize, error: &DeliveryError) {
    match error {
        DeliveryError::UnexpectedStatus { status, body } => warn!(
            "Unexpected HTTP status {} for batch {}; dropping {} records: {}",
            status, batch_id, record_count, body
        ),
        DeliveryError::RequestConstruction(reason) => error!(
            "Failed to build request for batch {}; dropping {} records: {}",
            batch_id, record_count, reason
        ),
        other => error!(
            "Failed to deliver batch {}; dropping {} records: {}",
            batch_id, record_count, other
        ),
    }
}
