#![allow(dead_code)]

use bytes::Bytes;
use parking_lot::Mutex;
use rask_loki_forwarder::sender::{Deliver, DeliveryError, DeliveryReport};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

/// In-memory delivery backend that keeps every payload it is handed.
#[derive(Clone, Default)]
pub struct RecordingDelivery {
    payloads: Arc<Mutex<Vec<Bytes>>>,
    fail_status: Arc<AtomicU16>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent deliveries fail with `status`; 0 restores success.
    pub fn fail_with(&self, status: u16) {
        self.fail_status.store(status, Ordering::SeqCst);
    }

    pub fn payload_count(&self) -> usize {
        self.payloads.lock().len()
    }

    pub fn batches(&self) -> Vec<Value> {
        self.payloads
            .lock()
            .iter()
            .map(|payload| serde_json::from_slice(payload).expect("payload is valid JSON"))
            .collect()
    }

    /// Raw lines of each delivered batch, in order.
    pub fn batch_lines(&self) -> Vec<Vec<String>> {
        self.batches().iter().map(stream_lines).collect()
    }
}

impl Deliver for RecordingDelivery {
    async fn deliver(&self, payload: Bytes) -> Result<DeliveryReport, DeliveryError> {
        let bytes_sent = payload.len();
        self.payloads.lock().push(payload);

        match self.fail_status.load(Ordering::SeqCst) {
            0 => Ok(DeliveryReport {
                status_code: 204,
                bytes_sent,
                latency: Duration::ZERO,
                compressed: false,
            }),
            status => Err(DeliveryError::UnexpectedStatus {
                status,
                body: "rejected".to_string(),
            }),
        }
    }
}

pub fn stream_lines(batch: &Value) -> Vec<String> {
    batch["streams"]
        .as_array()
        .expect("streams array")
        .iter()
        .map(|stream| {
            stream["values"][0][1]
                .as_str()
                .expect("raw line")
                .to_string()
        })
        .collect()
}
