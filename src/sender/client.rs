use bytes::Bytes;
use flate2::{Compression, write::GzEncoder};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderValue};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::future::Future;
use std::io::Write;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Longest response body kept on an error, in bytes.
const MAX_ERROR_BODY_LEN: usize = 512;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Failed to build request: {0}")]
    RequestConstruction(String),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

impl DeliveryError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DeliveryError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub status_code: u16,
    pub bytes_sent: usize,
    pub latency: Duration,
    pub compressed: bool,
}

/// The seam between the coordinator and the network.
pub trait Deliver: Send + Sync + 'static {
    fn deliver(
        &self,
        payload: Bytes,
    ) -> impl Future<Output = Result<DeliveryReport, DeliveryError>> + Send;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    /// Unset means a delivery may block for as long as the server holds it.
    pub timeout: Option<Duration>,
    pub user_agent: String,
    pub enable_compression: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3100/loki/api/v1/push".to_string(),
            timeout: None,
            user_agent: format!("rask-loki-forwarder/{}", env!("CARGO_PKG_VERSION")),
            enable_compression: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
    push_url: Url,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self, DeliveryError> {
        let push_url: Url = config.endpoint.parse().map_err(|e| {
            DeliveryError::InvalidConfiguration(format!("Invalid endpoint URL: {e}"))
        })?;

        let mut client_builder = ClientBuilder::new().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder.build().map_err(|e| {
            DeliveryError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            config,
            push_url,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn prepare_body(&self, payload: Bytes) -> Result<Bytes, DeliveryError> {
        if !self.config.enable_compression {
            return Ok(payload);
        }

        let mut encoder = GzEncoder::new(Vec::with_capacity(payload.len() / 4), Compression::fast());
        encoder
            .write_all(&payload)
            .map_err(|e| DeliveryError::RequestConstruction(format!("gzip failed: {e}")))?;
        let compressed = encoder
            .finish()
            .map_err(|e| DeliveryError::RequestConstruction(format!("gzip failed: {e}")))?;
        Ok(Bytes::from(compressed))
    }

    /// POSTs one encoded batch. Only `204 No Content` counts as delivered.
    pub async fn push(&self, payload: Bytes) -> Result<DeliveryReport, DeliveryError> {
        let start = Instant::now();
        let body = self.prepare_body(payload)?;
        let bytes_sent = body.len();

        let mut request_builder = self
            .client
            .post(self.push_url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if self.config.enable_compression {
            request_builder =
                request_builder.header(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        }

        let request = request_builder
            .body(body)
            .build()
            .map_err(|e| DeliveryError::RequestConstruction(e.to_string()))?;

        let response = self.client.execute(request).await?;
        let status = response.status();
        let latency = start.elapsed();

        if status != StatusCode::NO_CONTENT {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY_LEN {
                let mut cut = MAX_ERROR_BODY_LEN;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(DeliveryError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            "Pushed {} bytes to {} in {:?}",
            bytes_sent, self.push_url, latency
        );

        Ok(DeliveryReport {
            status_code: status.as_u16(),
            bytes_sent,
            latency,
            compressed: self.config.enable_compression,
        })
    }
}

impl Deliver for HttpClient {
    async fn deliver(&self, payload: Bytes) -> Result<DeliveryReport, DeliveryError> {
        self.push(payload).await
    }
}
