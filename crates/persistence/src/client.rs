//! REST client for the hosted backend.

use std::time::Duration;

use domain::services::StoreError;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::metrics::{record_request_failure, RequestTimer};

/// Header naming the backend project.
pub const PROJECT_HEADER: &str = "x-appwrite-project";

/// Header carrying the server API key.
pub const API_KEY_HEADER: &str = "x-appwrite-key";

/// Backend connection configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the REST API, e.g. `https://cloud.example.io/v1`.
    pub endpoint: String,
    pub project_id: String,
    /// Server API key; empty to send no key.
    pub api_key: String,
    pub database_id: String,
    pub timeout_ms: u64,
}

/// Errors building the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid value for header {0}")]
    InvalidHeader(&'static str),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Shared HTTP client bound to one backend project.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    config: BackendConfig,
}

/// Creates a backend client with the given configuration.
pub fn create_client(config: &BackendConfig) -> Result<BackendClient, ClientError> {
    BackendClient::new(config.clone())
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(config.endpoint.trim_end_matches('/'))
            .map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidEndpoint(config.endpoint.clone()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            PROJECT_HEADER,
            HeaderValue::from_str(&config.project_id)
                .map_err(|_| ClientError::InvalidHeader(PROJECT_HEADER))?,
        );
        if !config.api_key.is_empty() {
            let mut key = HeaderValue::from_str(&config.api_key)
                .map_err(|_| ClientError::InvalidHeader(API_KEY_HEADER))?;
            key.set_sensitive(true);
            headers.insert(API_KEY_HEADER, key);
        }

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Builds a URL from path segments, percent-encoding each one.
    pub fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport("Endpoint cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of a collection's documents in the configured database.
    pub fn documents_url(&self, collection: &str, id: Option<&str>) -> Result<Url, StoreError> {
        let mut segments = vec![
            "databases",
            self.config.database_id.as_str(),
            "collections",
            collection,
            "documents",
        ];
        segments.extend(id);
        self.url(&segments)
    }

    /// Sends a request and returns the decoded body of a successful response.
    pub(crate) async fn send(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<Value, StoreError> {
        let (status, body) = self.dispatch(request, operation).await?;
        if status.is_success() {
            return Ok(body);
        }

        let err = status_error(status, &body);
        record_request_failure(operation, "status");
        warn!(operation = %operation, status = status.as_u16(), error = %err, "Backend request rejected");
        Err(err)
    }

    /// Sends a request and returns the status with the decoded body.
    ///
    /// Only transport failures are errors. A body that is not JSON comes back
    /// as a JSON string; an empty body as `Value::Null`.
    pub(crate) async fn dispatch(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<(StatusCode, Value), StoreError> {
        let timer = RequestTimer::new(operation);
        let result = request.send().await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                timer.record();
                record_request_failure(operation, "transport");
                warn!(operation = %operation, error = %e, "Backend request failed");
                return Err(StoreError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        let text = response.text().await;
        timer.record();
        let text = text.map_err(|e| {
            record_request_failure(operation, "body");
            warn!(operation = %operation, error = %e, "Failed to read backend response");
            StoreError::Transport(e.to_string())
        })?;

        debug!(operation = %operation, status = status.as_u16(), "Backend request completed");
        Ok((status, decode_body(text)))
    }
}

fn decode_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// Maps a non-success response to a store error.
pub fn status_error(status: StatusCode, body: &Value) -> StoreError {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| body.as_str())
        .filter(|m| !m.trim().is_empty())
        .or_else(|| status.canonical_reason())
        .unwrap_or("Unknown error")
        .to_string();

    if status == StatusCode::NOT_FOUND {
        StoreError::NotFound(message)
    } else {
        StoreError::Backend {
            status: status.as_u16(),
            message,
        }
    }
}
