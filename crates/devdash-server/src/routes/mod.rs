use axum::body::Bytes;

use crate::error::AppError;

pub mod ai;
pub mod projects;
pub mod system;
pub mod verify;

/// Decode a request body as a JSON object. An empty body reads as `{}`, so a
/// bodiless request fails on its missing fields rather than its framing.
/// Malformed JSON is a 400 with the usual `{"error"}` body.
pub(crate) fn json_body(body: &Bytes) -> Result<serde_json::Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::bad_request(format!("invalid JSON body: {e}")))
}
