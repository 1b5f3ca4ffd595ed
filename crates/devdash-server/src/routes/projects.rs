use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use devdash_core::types::{Project, ProjectPatch};

use super::json_body;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/projects: every stored project.
pub async fn list_projects(State(app): State<AppState>) -> Result<Json<Vec<Project>>, AppError> {
    Ok(Json(app.store.list_projects().await?))
}

/// POST /api/projects: create a `Planning` project from `{name}`.
pub async fn create_project(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let body = json_body(&body)?;
    // A missing or non-string name is the same mistake as a blank one.
    let name = body.get("name").and_then(|n| n.as_str()).unwrap_or_default();
    let project = app.store.create_project(name).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Project>, AppError> {
    Ok(Json(app.store.get_project(&id).await?))
}

/// PUT /api/projects/{id}: shallow merge of the supplied fields.
pub async fn update_project(
    State(app): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Project>, AppError> {
    let patch = ProjectPatch::from_json(json_body(&body)?)?;
    Ok(Json(app.store.update_project(&id, patch).await?))
}

/// DELETE /api/projects/{id}
pub async fn delete_project(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    app.store.delete_project(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
