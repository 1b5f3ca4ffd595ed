use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use super::ProjectStore;
use crate::error::{DashError, Result};
use crate::types::{validate_name, ChatMessage, Project, ProjectPatch, Status};

const COLUMNS: &str = r#"id, name, status, "chatHistory" AS chat_history, logs"#;

/// Stores projects as rows of the `projects` table.
///
/// Ids are generated by the database. Row-level `UPDATE … RETURNING` gives
/// the merge its atomicity, so no in-process lock is needed. The schema in
/// `migrations/` must already be applied; [`PgProjectStore::migrate`] exists
/// for the explicit `devdash migrate` step and is never run implicitly.
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, acquire_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply the versioned schema.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Non-UUID ids can never match a row.
fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| DashError::ProjectNotFound(id.to_string()))
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {COLUMNS} FROM projects ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Project::try_from).collect()
    }

    async fn create_project(&self, name: &str) -> Result<Project> {
        let name = validate_name(name)?;
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"INSERT INTO projects (name, status, "chatHistory", logs)
               VALUES ($1, $2, '[]'::jsonb, '[]'::jsonb)
               RETURNING {COLUMNS}"#
        ))
        .bind(&name)
        .bind(Status::Planning.as_str())
        .fetch_one(&self.pool)
        .await?;
        let project = Project::try_from(row)?;
        tracing::info!(id = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    async fn get_project(&self, id: &str) -> Result<Project> {
        let uuid = parse_id(id)?;
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| DashError::ProjectNotFound(id.to_string()))
            .and_then(Project::try_from)
    }

    async fn update_project(&self, id: &str, patch: ProjectPatch) -> Result<Project> {
        let patch = patch.validated()?;
        let uuid = parse_id(id)?;
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"UPDATE projects SET
                 name          = COALESCE($2, name),
                 status        = COALESCE($3, status),
                 "chatHistory" = COALESCE($4, "chatHistory"),
                 logs          = COALESCE($5, logs),
                 updated_at    = NOW()
               WHERE id = $1
               RETURNING {COLUMNS}"#
        ))
        .bind(uuid)
        .bind(patch.name)
        .bind(patch.status.map(Status::as_str))
        .bind(patch.chat_history.map(Json))
        .bind(patch.logs.map(Json))
        .fetch_optional(&self.pool)
        .await?;
        // Zero rows touched means the id does not exist.
        row.ok_or_else(|| DashError::ProjectNotFound(id.to_string()))
            .and_then(Project::try_from)
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        let uuid = parse_id(id)?;
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DashError::ProjectNotFound(id.to_string()));
        }
        tracing::info!(id, "project deleted");
        Ok(())
    }
}

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    status: String,
    chat_history: Json<Vec<ChatMessage>>,
    logs: Json<Vec<String>>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = DashError;

    fn try_from(r: ProjectRow) -> Result<Self> {
        let status = r.status.parse::<Status>().map_err(|_| {
            DashError::Store(format!(
                "project {} has unrecognized status '{}' in the database",
                r.id, r.status
            ))
        })?;
        Ok(Self {
            id: r.id.to_string(),
            name: r.name,
            status,
            chat_history: r.chat_history.0,
            logs: r.logs.0,
        })
    }
}
