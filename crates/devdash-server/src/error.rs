use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use devdash_core::DashError;
use gemini_agent::GeminiError;

// ---------------------------------------------------------------------------
// Internal sentinels
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 400 through the `anyhow::Error` chain.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

/// Carries an explicit HTTP 503 for features that are not configured.
#[derive(Debug)]
struct UnavailableError(String);

impl std::fmt::Display for UnavailableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UnavailableError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses. Bodies are `{"error": "..."}`,
/// plus `rawText` when a model reply could not be parsed.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self(UnavailableError(msg.into()).into())
    }

    fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<BadRequestError>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        if self.0.downcast_ref::<UnavailableError>().is_some() {
            return StatusCode::SERVICE_UNAVAILABLE;
        }
        if let Some(e) = self.0.downcast_ref::<DashError>() {
            return match e {
                DashError::Validation(_) | DashError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
                DashError::ProjectNotFound(_) => StatusCode::NOT_FOUND,
                DashError::Transport(_) => StatusCode::BAD_GATEWAY,
                DashError::Parse { .. }
                | DashError::Store(_)
                | DashError::Config(_)
                | DashError::Io(_)
                | DashError::Json(_)
                | DashError::Yaml(_)
                | DashError::Database(_)
                | DashError::Migrate(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        if let Some(e) = self.0.downcast_ref::<GeminiError>() {
            return match e {
                GeminiError::MissingApiKey(_) => StatusCode::SERVICE_UNAVAILABLE,
                GeminiError::Http(_) | GeminiError::Api { .. } | GeminiError::EmptyResponse => {
                    StatusCode::BAD_GATEWAY
                }
                GeminiError::Parse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn raw_text(&self) -> Option<&str> {
        if let Some(e) = self.0.downcast_ref::<GeminiError>() {
            return e.raw_text();
        }
        match self.0.downcast_ref::<DashError>() {
            Some(DashError::Parse { raw, .. }) => Some(raw),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "request failed: {:#}", self.0);
        }

        let mut body = serde_json::json!({ "error": self.0.to_string() });
        if let Some(raw) = self.raw_text() {
            body["rawText"] = raw.into();
        }
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
