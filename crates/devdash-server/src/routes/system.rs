use axum::extract::State;
use axum::Json;
use devdash_core::config::StoreBackend;

use crate::state::AppState;

/// GET /api/system-check: which required settings are present.
pub async fn system_check(State(app): State<AppState>) -> Json<serde_json::Value> {
    let config = &app.config;
    let mut checks = serde_json::Map::new();

    checks.insert(
        config.ai.api_key_env.clone(),
        config.ai.api_key().is_some().into(),
    );
    if config.store.backend == StoreBackend::Postgres {
        checks.insert(
            "DATABASE_URL".into(),
            config.store.database_url().is_some().into(),
        );
    }
    let build_program = config.build.command.first().cloned().unwrap_or_default();
    let build_found = !build_program.is_empty() && which::which(&build_program).is_ok();
    checks.insert(format!("build:{build_program}"), build_found.into());

    let all_set = checks.values().all(|v| v.as_bool() == Some(true));
    Json(serde_json::json!({
        "status": if all_set { "ok" } else { "incomplete" },
        "store": match config.store.backend {
            StoreBackend::File => "file",
            StoreBackend::Postgres => "postgres",
        },
        "checks": checks,
    }))
}
