pub mod client;
pub mod failure;
pub mod metrics;
pub mod serialization;
pub mod transmission;

pub use client::{ClientConfig, Deliver, DeliveryError, DeliveryReport, HttpClient};
pub use failure::{FailedDelivery, FailureHandler};
pub use metrics::{DeliveryMetrics, MetricsCollector};
pub use serialization::{LokiSerializer, SerializationError, TimestampPrecision};
pub use transmission::{BatchTransmitter, TransmissionOutcome};
