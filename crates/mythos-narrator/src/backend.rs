//! Completion backends for the generative narrator.

use std::time::Duration;

use async_trait::async_trait;
use mythos_session::application::narrator::NarratorError;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// A text-completion service: one system prompt, one user prompt, one
/// text answer.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Completes `user` under the instructions in `system`.
    ///
    /// # Errors
    ///
    /// Returns `NarratorError::Transport` when the service cannot be
    /// reached or rejects the request, and `NarratorError::Malformed` when
    /// its reply cannot be read.
    async fn complete(&self, system: &str, user: &str) -> Result<String, NarratorError>;
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [ApiMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiContent>,
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Client for an Anthropic-style Messages API.
#[derive(Clone)]
pub struct MessagesBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

impl std::fmt::Debug for MessagesBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagesBackend")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MessagesBackend {
    /// Creates a backend authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns `NarratorError::Transport` if the HTTP client cannot be
    /// built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, NarratorError> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NarratorError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_owned(),
            base_url: API_BASE.to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the backend at a different API root, such as a proxy.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Model in use.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_headers(&self) -> Result<HeaderMap, NarratorError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|_| NarratorError::Transport("invalid API key header".to_owned()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    fn build_request<'a>(&'a self, system: &'a str, user: &'a str) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system,
            messages: [ApiMessage {
                role: "user",
                content: user,
            }],
        }
    }
}

/// Concatenates the text blocks of a Messages API reply.
fn response_text(response: ApiResponse) -> Result<String, NarratorError> {
    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text)
        .collect();
    if text.trim().is_empty() {
        return Err(NarratorError::Malformed("empty completion".to_owned()));
    }
    Ok(text)
}

#[async_trait]
impl CompletionBackend for MessagesBackend {
    async fn complete(&self, system: &str, user: &str) -> Result<String, NarratorError> {
        let headers = self.build_headers()?;
        let body = self.build_request(system, user);

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| NarratorError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status, "completion request rejected");
            return Err(NarratorError::Transport(format!(
                "API error (status {status}): {message}"
            )));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| NarratorError::Malformed(e.to_string()))?;
        response_text(api_response)
    }
}
