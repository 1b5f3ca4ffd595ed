//! The session's two external collaborators: an AI assistant and a build
//! verifier. Both sit behind traits so the session can be driven by fakes;
//! the HTTP implementations talk to a devdash server.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{DashError, Result};
use crate::http::ApiClient;
use crate::types::{BuildReport, CliCommand};

#[async_trait]
pub trait Assistant: Send + Sync {
    /// Free-form completion.
    async fn chat(&self, prompt: &str) -> Result<String>;

    /// Break a task into CLI steps. Unparseable model output is
    /// [`DashError::Parse`] carrying the raw reply.
    async fn decompose(&self, task: &str) -> Result<Vec<CliCommand>>;
}

#[async_trait]
pub trait BuildVerifier: Send + Sync {
    /// Run the build. A failing build is `Ok` with `success == false`; `Err`
    /// means the verifier itself could not be reached.
    async fn verify(&self) -> Result<BuildReport>;
}

// ---------------------------------------------------------------------------
// HTTP implementations
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AiErrorBody {
    error: String,
    #[serde(default, rename = "rawText")]
    raw_text: Option<String>,
}

#[derive(Deserialize)]
struct ChatReply {
    text: String,
}

#[derive(Deserialize)]
struct DecomposeReply {
    commands: Vec<CliCommand>,
}

/// [`Assistant`] backed by `POST /api/ai`.
#[derive(Debug, Clone)]
pub struct HttpAssistant {
    api: ApiClient,
}

impl HttpAssistant {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn ask<T: serde::de::DeserializeOwned>(&self, prompt: &str, kind: &str) -> Result<T> {
        let response = self
            .api
            .http()
            .post(self.api.url("/api/ai"))
            .json(&serde_json::json!({ "prompt": prompt, "type": kind }))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let Ok(body) = serde_json::from_str::<AiErrorBody>(&text) else {
            return Err(DashError::Transport(format!("assistant returned {status}")));
        };
        Err(match (status.as_u16(), body.raw_text) {
            (_, Some(raw)) => DashError::Parse {
                message: body.error,
                raw,
            },
            (400, None) => DashError::Validation(body.error),
            (_, None) => DashError::Transport(format!("assistant returned {status}: {}", body.error)),
        })
    }
}

#[async_trait]
impl Assistant for HttpAssistant {
    async fn chat(&self, prompt: &str) -> Result<String> {
        let reply: ChatReply = self.ask(prompt, "chat").await?;
        Ok(reply.text)
    }

    async fn decompose(&self, task: &str) -> Result<Vec<CliCommand>> {
        let reply: DecomposeReply = self.ask(task, "decompose").await?;
        Ok(reply.commands)
    }
}

/// [`BuildVerifier`] backed by `POST /api/verify`.
#[derive(Debug, Clone)]
pub struct HttpBuildVerifier {
    api: ApiClient,
}

impl HttpBuildVerifier {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl BuildVerifier for HttpBuildVerifier {
    async fn verify(&self) -> Result<BuildReport> {
        let response = self
            .api
            .http()
            .post(self.api.url("/api/verify"))
            .send()
            .await?;
        let status = response.status();
        // A failed build answers 500 with a full report.
        let text = response.text().await?;
        serde_json::from_str::<BuildReport>(&text).map_err(|_| {
            DashError::Transport(format!("build verifier returned {status}: {text}"))
        })
    }
}
