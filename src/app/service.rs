use super::EngineConfig;
use crate::buffer::{BatchCoordinator, LogSubmitter, SubmitError};
use crate::domain::{ForwarderError, LogRecord};
use crate::sender::{
    BatchTransmitter, Deliver, DeliveryMetrics, FailureHandler, HttpClient, LokiSerializer,
    MetricsCollector,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Collects optional hooks before the coordinator is launched.
pub struct ForwarderBuilder {
    config: EngineConfig,
    failure_handler: Option<Arc<dyn FailureHandler>>,
}

impl ForwarderBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            failure_handler: None,
        }
    }

    pub fn on_failure(mut self, handler: impl FailureHandler + 'static) -> Self {
        self.failure_handler = Some(Arc::new(handler));
        self
    }

    /// Validates the configuration and launches the coordinator with the HTTP
    /// client. Must be called from within a tokio runtime.
    pub fn start(self) -> Result<Forwarder, ForwarderError> {
        self.config.validate()?;
        let client = HttpClient::new(self.config.client_config())?;
        Ok(self.launch(client))
    }

    /// Like [`start`](Self::start) but with a caller-supplied delivery backend.
    pub fn start_with_delivery<D: Deliver>(self, delivery: D) -> Result<Forwarder, ForwarderError> {
        self.config.validate()?;
        Ok(self.launch(delivery))
    }

    fn launch<D: Deliver>(self, delivery: D) -> Forwarder {
        let metrics = MetricsCollector::new();
        let serializer = LokiSerializer::new(
            self.config.labels.iter().cloned(),
            self.config.timestamp_precision,
        );
        let transmitter =
            BatchTransmitter::new(delivery, serializer, metrics.clone(), self.failure_handler);

        let shutdown = CancellationToken::new();
        let (coordinator, submitter) =
            BatchCoordinator::new(self.config.batch_config(), transmitter, shutdown.clone());
        let handle = tokio::spawn(coordinator.run());

        info!(
            "Forwarder started (endpoint={}, labels={:?})",
            self.config.endpoint, self.config.labels
        );

        Forwarder {
            submitter,
            metrics,
            shutdown,
            handle,
        }
    }
}

/// A running forwarder: the submission side of a background batch coordinator.
pub struct Forwarder {
    submitter: LogSubmitter,
    metrics: MetricsCollector,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl Forwarder {
    pub fn builder(config: EngineConfig) -> ForwarderBuilder {
        ForwarderBuilder::new(config)
    }

    pub fn start(config: EngineConfig) -> Result<Self, ForwarderError> {
        ForwarderBuilder::new(config).start()
    }

    pub async fn submit(&self, record: LogRecord) -> Result<(), SubmitError> {
        self.submitter.submit(record).await
    }

    /// A producer handle that can be moved to other tasks or threads.
    pub fn submitter(&self) -> LogSubmitter {
        self.submitter.clone()
    }

    pub fn metrics(&self) -> DeliveryMetrics {
        self.metrics.snapshot()
    }

    /// Signals shutdown and waits for the final flush to finish. There is no
    /// timeout: a delivery that never returns keeps this waiting.
    pub async fn stop(self) -> Result<DeliveryMetrics, ForwarderError> {
        info!("Initiating graceful shutdown...");
        self.shutdown.cancel();

        if let Err(e) = self.handle.await {
            error!("Batch coordinator terminated abnormally: {}", e);
            return Err(ForwarderError::Shutdown(e.to_string()));
        }

        let metrics = self.metrics.snapshot();
        info!(
            "Graceful shutdown completed ({} records delivered, {} dropped)",
            metrics.records_delivered, metrics.records_dropped
        );
        Ok(metrics)
    }
}
