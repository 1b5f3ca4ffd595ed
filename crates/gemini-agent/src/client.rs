use std::time::Duration;

use crate::decompose::{decompose_prompt, parse_commands};
use crate::types::{CommandStep, GenerateRequest, GenerateResponse};
use crate::{GeminiError, Result};

/// Public Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

// ─── GeminiClient ─────────────────────────────────────────────────────────

/// Thin async client over `models/{model}:generateContent`.
///
/// Cheap to clone; the underlying `reqwest::Client` pools connections.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiClient {
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::default()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one prompt and return the reply text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "gemini generateContent");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest::text(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed.text().ok_or(GeminiError::EmptyResponse)
    }

    /// Ask the model to break `request` into CLI commands and parse the reply.
    pub async fn decompose(&self, request: &str) -> Result<Vec<CommandStep>> {
        let text = self.generate(&decompose_prompt(request)).await?;
        parse_commands(&text)
    }
}

// ─── Builder ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiClientBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override the endpoint (tests point this at a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fails with [`GeminiError::MissingApiKey`] when no non-empty key was set.
    pub fn build(self) -> Result<GeminiClient> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GeminiError::MissingApiKey("GEMINI_API_KEY".into()))?;

        let http = reqwest::Client::builder()
            .timeout(
                self.timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            )
            .build()?;

        Ok(GeminiClient {
            http,
            api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
