//! Veo backend for the Google Generative Language API.
//!
//! Submission uses the long-running `predictLongRunning` call; status is
//! re-queried through the operations endpoint; delivery URIs are fetched
//! with the key appended as a query parameter. A fresh HTTP client is built
//! for every call and the key is re-read from the credential host at each
//! point of use, so a credential rotated mid-workflow takes effect on the
//! next call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credentials::CredentialHost;
use crate::domain::{GenerationRequest, Operation};

use super::{BackendError, DownloadedMedia, VideoBackend};

/// Configuration for the Veo backend
#[derive(Debug, Clone)]
pub struct VeoConfig {
    /// API base URL
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for VeoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "veo-3.1-fast-generate-preview".to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Veo generation backend
pub struct VeoBackend {
    config: VeoConfig,
    credentials: Arc<dyn CredentialHost>,
}

/// Submission request body
#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
    image: ImagePayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagePayload {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    sample_count: u32,
    resolution: &'static str,
    aspect_ratio: &'static str,
}

/// Error envelope the API wraps failures in
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl VeoBackend {
    /// Create a backend with the given configuration and credential host
    pub fn new(config: VeoConfig, credentials: Arc<dyn CredentialHost>) -> Self {
        Self {
            config,
            credentials,
        }
    }

    /// Build a fresh HTTP client.
    ///
    /// Clients are never reused across calls so credential rotation and
    /// environment changes take effect per call.
    fn http(&self) -> Result<reqwest::Client, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(self.config.request_timeout)
            .build()?;
        Ok(client)
    }

    /// Read the active key live from the credential host
    async fn api_key(&self) -> Result<String, BackendError> {
        self.credentials
            .api_key()
            .await
            .ok_or(BackendError::MissingCredential)
    }

    /// URL for job submission
    fn submit_url(&self) -> String {
        format!(
            "{}/models/{}:predictLongRunning",
            self.config.base_url, self.config.model
        )
    }

    /// URL for re-querying an operation by its remote name
    fn operation_url(&self, operation_name: &str) -> String {
        format!("{}/{}", self.config.base_url, operation_name)
    }

    /// Delivery URI with the key appended as a query parameter
    fn authenticated_url(uri: &str, key: &str) -> String {
        let separator = if uri.contains('?') { '&' } else { '?' };
        format!("{}{}key={}", uri, separator, key)
    }

    /// Parse an operation snapshot, surfacing API error envelopes
    async fn parse_operation(response: reqwest::Response) -> Result<Operation, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let operation: Operation = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        Ok(operation)
    }
}

/// Build an Api error from a non-success response body
fn api_error(status: u16, body: &str) -> BackendError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.trim().to_string());

    BackendError::Api { status, message }
}

#[async_trait]
impl VideoBackend for VeoBackend {
    fn name(&self) -> &str {
        "veo"
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Operation, BackendError> {
        let key = self.api_key().await?;
        let url = self.submit_url();

        let body = PredictRequest {
            instances: vec![Instance {
                prompt: request.enhanced_prompt(),
                image: ImagePayload {
                    bytes_base64_encoded: BASE64.encode(&request.image_bytes),
                    mime_type: request.mime_type.clone(),
                },
            }],
            parameters: Parameters {
                sample_count: 1,
                resolution: "720p",
                aspect_ratio: request.aspect_ratio.as_str(),
            },
        };

        debug!(model = %self.config.model, "Submitting generation job");

        let response = self
            .http()?
            .post(&url)
            .query(&[("key", key.as_str())])
            .json(&body)
            .send()
            .await?;

        Self::parse_operation(response).await
    }

    async fn query(&self, operation: &Operation) -> Result<Operation, BackendError> {
        let key = self.api_key().await?;
        let url = self.operation_url(&operation.name);

        let response = self
            .http()?
            .get(&url)
            .query(&[("key", key.as_str())])
            .send()
            .await?;

        Self::parse_operation(response).await
    }

    async fn download(&self, uri: &str) -> Result<DownloadedMedia, BackendError> {
        // Re-read the key: it may have rotated since submission
        let key = self.api_key().await?;
        let url = Self::authenticated_url(uri, &key);

        let response = self.http()?.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        let bytes = response.bytes().await?.to_vec();
        debug!(size_bytes = bytes.len(), "Downloaded video payload");

        Ok(DownloadedMedia { bytes, mime_type })
    }
}
