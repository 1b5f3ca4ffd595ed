use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::ProjectStore;
use crate::error::{DashError, Result};
use crate::types::{validate_name, Project, ProjectPatch};

/// Stores every project in one pretty-printed JSON array.
///
/// Reads go straight to disk; the document is replaced atomically so a
/// reader never sees a partial write. Read-modify-write cycles are
/// serialized through `write_lock`, otherwise two near-simultaneous writers
/// would each rewrite the file from the same stale read and one update would
/// vanish.
pub struct FileProjectStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileProjectStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<Project>> {
        let Some(data) = crate::io::read_optional(&self.path)? else {
            return Ok(Vec::new());
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&data) {
            Ok(projects) => Ok(projects),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "project file is not a valid project list; treating it as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    fn write_all(&self, projects: &[Project]) -> Result<()> {
        let data = serde_json::to_string_pretty(projects)?;
        crate::io::atomic_write(&self.path, data.as_bytes())
    }
}

/// `proj-<millis>`, bumped past any id already taken.
fn next_id(existing: &[Project]) -> String {
    let mut millis = chrono::Utc::now().timestamp_millis();
    loop {
        let candidate = format!("proj-{millis}");
        if !existing.iter().any(|p| p.id == candidate) {
            return candidate;
        }
        millis += 1;
    }
}

#[async_trait]
impl ProjectStore for FileProjectStore {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.read_all()
    }

    async fn create_project(&self, name: &str) -> Result<Project> {
        let name = validate_name(name)?;
        let _guard = self.write_lock.lock().await;

        let mut projects = self.read_all()?;
        let project = Project::new(next_id(&projects), name);
        projects.push(project.clone());
        self.write_all(&projects)?;

        tracing::info!(id = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    async fn get_project(&self, id: &str) -> Result<Project> {
        self.read_all()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| DashError::ProjectNotFound(id.to_string()))
    }

    async fn update_project(&self, id: &str, patch: ProjectPatch) -> Result<Project> {
        let patch = patch.validated()?;
        let _guard = self.write_lock.lock().await;

        let mut projects = self.read_all()?;
        let project = projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DashError::ProjectNotFound(id.to_string()))?;
        patch.apply(project);
        let updated = project.clone();
        self.write_all(&projects)?;

        tracing::debug!(id, "project updated");
        Ok(updated)
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut projects = self.read_all()?;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        if projects.len() == before {
            return Err(DashError::ProjectNotFound(id.to_string()));
        }
        self.write_all(&projects)?;

        tracing::info!(id, "project deleted");
        Ok(())
    }
}
