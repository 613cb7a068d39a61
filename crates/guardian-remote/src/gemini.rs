//! Gemini `generateContent` client.

use crate::wire::{GenerateRequest, GenerateResponse};
use guardian_core::{ChatBackend, DelegationError, DEFAULT_CHAT_TIMEOUT};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid API credential: {0}")]
    InvalidCredential(&'static str),
    #[error("invalid model name: {0:?}")]
    InvalidModel(String),
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Connection settings for the remote model.
#[derive(Clone)]
pub struct ChatConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ChatConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_CHAT_TIMEOUT,
        }
    }
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Remote chat backend over the Gemini REST API.
pub struct GeminiChat {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl GeminiChat {
    /// Validate the credential and build the HTTP client.
    ///
    /// A blank key, or one containing whitespace or control characters, is
    /// rejected here rather than failing on every request.
    pub fn new(config: &ChatConfig) -> Result<Self, ClientError> {
        let key = config.api_key.as_str();
        if key.trim().is_empty() {
            return Err(ClientError::InvalidCredential("key is empty"));
        }
        if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ClientError::InvalidCredential(
                "key contains whitespace or control characters",
            ));
        }

        let model = config.model.trim();
        if model.is_empty() || model.contains(['/', '?', '#', ' ']) {
            return Err(ClientError::InvalidModel(config.model.clone()));
        }

        let mut key_value = HeaderValue::from_str(key)
            .map_err(|_| ClientError::InvalidCredential("key is not a valid header value"))?;
        key_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let endpoint = format!(
            "{}/models/{model}:generateContent",
            config.base_url.trim_end_matches('/')
        );

        tracing::info!(%endpoint, timeout = ?config.timeout, "remote chat backend configured");

        Ok(Self {
            client,
            endpoint,
            timeout: config.timeout,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> DelegationError {
        if err.is_timeout() {
            DelegationError::Timeout(self.timeout)
        } else {
            DelegationError::Transport(err.to_string())
        }
    }
}

impl ChatBackend for GeminiChat {
    async fn complete(&self, prompt: &str) -> Result<String, DelegationError> {
        tracing::debug!(endpoint = %self.endpoint, prompt_chars = prompt.len(), "sending generateContent");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DelegationError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let payload: GenerateResponse = serde_json::from_slice(&body)
            .map_err(|e| DelegationError::Malformed(e.to_string()))?;

        payload
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| DelegationError::Malformed("response has no text candidate".into()))
    }
}
