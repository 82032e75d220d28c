use crate::buffer::FlushTrigger;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Point-in-time view of the delivery counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryMetrics {
    pub size_flushes: u64,
    pub age_flushes: u64,
    pub shutdown_flushes: u64,
    pub batches_delivered: u64,
    pub records_delivered: u64,
    pub batches_dropped: u64,
    pub records_dropped: u64,
    pub bytes_sent: u64,
    pub average_latency: Duration,
}

impl DeliveryMetrics {
    pub fn total_flushes(&self) -> u64 {
        self.size_flushes + self.age_flushes + self.shutdown_flushes
    }
}

#[derive(Clone, Default)]
pub struct MetricsCollector {
    size_flushes: Arc<AtomicU64>,
    age_flushes: Arc<AtomicU64>,
    shutdown_flushes: Arc<AtomicU64>,
    batches_delivered: Arc<AtomicU64>,
    records_delivered: Arc<AtomicU64>,
    batches_dropped: Arc<AtomicU64>,
    records_dropped: Arc<AtomicU64>,
    bytes_sent: Arc<AtomicU64>,
    total_latency_ms: Arc<AtomicU64>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_flush(&self, trigger: FlushTrigger) {
        let counter = match trigger {
            FlushTrigger::SizeBased => &self.size_flushes,
            FlushTrigger::AgeBased => &self.age_flushes,
            FlushTrigger::Shutdown => &self.shutdown_flushes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self, records: usize, bytes_sent: usize, latency: Duration) {
        self.batches_delivered.fetch_add(1, Ordering::Relaxed);
        self.records_delivered
            .fetch_add(records as u64, Ordering::Relaxed);
        self.bytes_sent
            .fetch_add(bytes_sent as u64, Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(latency.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, records: usize) {
        self.batches_dropped.fetch_add(1, Ordering::Relaxed);
        self.records_dropped
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliveryMetrics {
        let batches_delivered = self.batches_delivered.load(Ordering::Relaxed);
        let average_latency = if batches_delivered > 0 {
            Duration::from_millis(self.total_latency_ms.load(Ordering::Relaxed) / batches_delivered)
        } else {
            Duration::ZERO
        };

        DeliveryMetrics {
            size_flushes: self.size_flushes.load(Ordering::Relaxed),
            age_flushes: self.age_flushes.load(Ordering::Relaxed),
            shutdown_flushes: self.shutdown_flushes.load(Ordering::Relaxed),
            batches_delivered,
            records_delivered: self.records_delivered.load(Ordering::Relaxed),
            batches_dropped: self.batches_dropped.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            average_latency,
        }
    }
}
