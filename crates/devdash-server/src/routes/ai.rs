use axum::body::Bytes;
use axum::extract::State;
use axum::Json;

use super::json_body;
use crate::error::AppError;
use crate::state::AppState;

/// POST /api/ai: `{prompt, type?}` where `type` is `chat` (default) or
/// `decompose`.
///
/// Chat answers `{text}`. Decompose wraps the prompt in the decomposition
/// instruction and answers `{commands}`; a reply that is not a command list
/// answers 500 with the model's `rawText`.
pub async fn complete(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let body = json_body(&body)?;
    let prompt = body
        .get("prompt")
        .and_then(|p| p.as_str())
        .map(str::trim)
        .unwrap_or_default();
    if prompt.is_empty() {
        return Err(AppError::bad_request("prompt is required"));
    }
    let decompose = match body.get("type").and_then(|t| t.as_str()) {
        None | Some("chat") => false,
        Some("decompose") => true,
        Some(other) => {
            return Err(AppError::bad_request(format!(
                "unknown type '{other}': expected chat or decompose"
            )))
        }
    };
    let Some(client) = app.ai.as_ref() else {
        return Err(AppError::unavailable("AI assistant is not configured"));
    };

    if decompose {
        let commands = client.decompose(prompt).await?;
        tracing::info!(count = commands.len(), "task decomposed");
        Ok(Json(serde_json::json!({ "commands": commands })))
    } else {
        let text = client.generate(prompt).await?;
        Ok(Json(serde_json::json!({ "text": text })))
    }
}
