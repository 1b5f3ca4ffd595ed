use std::time::Duration;

use serde::Deserialize;

use crate::error::{DashError, Result};

/// Shared HTTP plumbing for talking to a devdash server.
///
/// Every request carries a timeout; expiry surfaces as
/// [`DashError::Transport`] through the `reqwest::Error` conversion.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Turn a non-success response into the matching error. 400 and 404 map
    /// onto the store taxonomy; everything else is a store failure carrying
    /// the server's message.
    pub async fn error_from(&self, response: reqwest::Response, subject: &str) -> DashError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                if text.is_empty() {
                    status.to_string()
                } else {
                    text
                }
            });
        match status.as_u16() {
            400 => DashError::Validation(message),
            404 => DashError::ProjectNotFound(subject.to_string()),
            _ => DashError::Store(format!("server returned {status}: {message}")),
        }
    }
}
