use std::fmt;

use async_trait::async_trait;
use farmware_core::BackendConfig;
use farmware_core::CollectionKind;
use farmware_core::DispatchRequest;
use serde_json::Value;
use tracing::debug;

use crate::error::ClientError;

const MAX_ERROR_BODY_CHARS: usize = 200;

/// The three collaborator endpoints. Implementations return the raw JSON
/// envelope; decoding into domain outcomes happens in `farmware_core::wire`.
#[async_trait]
pub trait DashboardBackend: Send + Sync + 'static {
    async fn fetch_collection(&self, kind: CollectionKind) -> Result<Value, ClientError>;

    async fn send_advisory(&self, request: &DispatchRequest) -> Result<Value, ClientError>;
}

#[derive(Clone)]
pub struct HttpBackend {
    config: BackendConfig,
    client: reqwest::Client,
}

impl fmt::Debug for HttpBackend {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpBackend")
            .field("base_url", &self.config.base_url)
            .field("timeout_secs", &self.config.request_timeout_secs)
            .finish()
    }
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, ClientError> {
        if config.request_timeout_secs == 0 {
            return Err(ClientError::Configuration {
                message: "request timeout must be greater than zero".to_string(),
            });
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("farmware/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| ClientError::Configuration {
                message: format!("failed to initialize HTTP client: {err}"),
            })?;
        Ok(Self { config, client })
    }

    async fn request_json(&self, request: reqwest::RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(
            event = "client.http.response",
            status = status.as_u16(),
            bytes = body.len()
        );

        // The backend reports domain failures as JSON with a non-2xx status,
        // so the envelope is read whenever it parses.
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(ClientError::Status {
                status: status.as_u16(),
                body: truncate_for_error(&body),
            }),
            Err(err) => Err(ClientError::MalformedBody {
                message: err.to_string(),
            }),
        }
    }
}

#[async_trait]
impl DashboardBackend for HttpBackend {
    async fn fetch_collection(&self, kind: CollectionKind) -> Result<Value, ClientError> {
        let url = self.config.collection_url(kind);
        self.request_json(self.client.get(url)).await
    }

    async fn send_advisory(&self, request: &DispatchRequest) -> Result<Value, ClientError> {
        let url = self.config.dispatch_url();
        self.request_json(self.client.post(url).json(request)).await
    }
}

fn truncate_for_error(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
