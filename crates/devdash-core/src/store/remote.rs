use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::ProjectStore;
use crate::error::{DashError, Result};
use crate::http::ApiClient;
use crate::types::{validate_name, Project, ProjectPatch};

/// [`ProjectStore`] over the server's `/api/projects` endpoints.
///
/// Used by clients (the CLI and the sync client) so they program against the
/// same contract the server implements.
#[derive(Debug, Clone)]
pub struct RemoteProjectStore {
    api: ApiClient,
}

impl RemoteProjectStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn decode<T: DeserializeOwned>(&self, response: reqwest::Response, id: &str) -> Result<T> {
        if !response.status().is_success() {
            return Err(self.api.error_from(response, id).await);
        }
        Ok(response.json().await?)
    }

    /// `/api/projects/{id}` with `id` as one percent-encoded segment. Dot
    /// segments would be normalized away and can never name a project.
    fn project_url(&self, id: &str) -> Result<reqwest::Url> {
        if matches!(id, "" | "." | "..") {
            return Err(DashError::ProjectNotFound(id.to_string()));
        }
        let base = self.api.url("/api/projects");
        let mut url = reqwest::Url::parse(&base)
            .map_err(|e| DashError::Config(format!("invalid server URL {base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| DashError::Config(format!("invalid server URL {base}")))?
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl ProjectStore for RemoteProjectStore {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let response = self
            .api
            .http()
            .get(self.api.url("/api/projects"))
            .send()
            .await?;
        self.decode(response, "").await
    }

    async fn create_project(&self, name: &str) -> Result<Project> {
        let name = validate_name(name)?;
        let response = self
            .api
            .http()
            .post(self.api.url("/api/projects"))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?;
        self.decode(response, "").await
    }

    async fn get_project(&self, id: &str) -> Result<Project> {
        let response = self.api.http().get(self.project_url(id)?).send().await?;
        self.decode(response, id).await
    }

    async fn update_project(&self, id: &str, patch: ProjectPatch) -> Result<Project> {
        let response = self
            .api
            .http()
            .put(self.project_url(id)?)
            .json(&patch)
            .send()
            .await?;
        self.decode(response, id).await
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        let response = self.api.http().delete(self.project_url(id)?).send().await?;
        if !response.status().is_success() {
            return Err(self.api.error_from(response, id).await);
        }
        Ok(())
    }
}
