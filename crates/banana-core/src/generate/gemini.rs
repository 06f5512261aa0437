//! Gemini image model over the Generative Language `generateContent` API.
//!
//! Sends inline image + text parts and returns the raw candidate list; image
//! extraction and retries live in the orchestrator.

use super::provider::{ImageModel, ModelResponse, RequestPart};
use crate::config::{Config, GeminiConfig};
use crate::error::GenerationError;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Builder for `GeminiClient`.
#[derive(Debug, Clone)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl Default for GeminiClientBuilder {
    fn default() -> Self {
        Self::from_gemini_config(&GeminiConfig::default())
    }
}

impl GeminiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_gemini_config(config: &GeminiConfig) -> Self {
        Self {
            api_key: None,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Start from a loaded config, resolving the API key the usual way.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::from_gemini_config(&config.gemini);
        builder.api_key = config.api_key();
        builder
    }

    /// Sets the API key explicitly.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Per-attempt HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    ///
    /// A missing key is allowed: the service answers 401/403, which is
    /// reported as a non-retryable failure.
    pub fn build(self) -> Result<GeminiClient, GenerationError> {
        let api_key = self.api_key.unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!("No Gemini API key configured; requests will be rejected");
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| GenerationError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(GeminiClient {
            client,
            api_key,
            endpoint: self.endpoint.trim_end_matches('/').to_string(),
            model: self.model,
        })
    }
}

/// Gemini image model client.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

// --- Request types ---

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: &'a [RequestPart],
}

impl<'a> GenerateContentRequest<'a> {
    fn new(parts: &'a [RequestPart]) -> Self {
        Self {
            contents: vec![RequestContent { parts }],
        }
    }
}

#[async_trait]
impl ImageModel for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate_content(
        &self,
        parts: &[RequestPart],
    ) -> Result<ModelResponse, GenerationError> {
        let body = GenerateContentRequest::new(parts);

        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(format!("Gemini request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: text.trim().to_string(),
            });
        }

        resp.json::<ModelResponse>()
            .await
            .map_err(|e| GenerationError::Decode(format!("Failed to parse Gemini response: {e}")))
    }
}
