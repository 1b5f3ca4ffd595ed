use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use devdash_core::types::BuildReport;

use crate::state::AppState;
use crate::subprocess::verify_build;

/// POST /api/verify: run the configured build in the project root.
///
/// Always answers with a full report: 200 when the build passed, 500 when it
/// failed, could not start or timed out.
pub async fn verify(State(app): State<AppState>) -> (StatusCode, Json<BuildReport>) {
    let report = verify_build(&app.config.build, &app.root).await;
    let status = if report.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(report))
}
