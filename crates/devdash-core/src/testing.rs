//! In-memory fakes shared by unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{DashError, Result};
use crate::store::ProjectStore;
use crate::types::{validate_name, Project, ProjectPatch};

/// A [`ProjectStore`] that records every call.
#[derive(Default)]
pub struct MemoryStore {
    projects: Mutex<BTreeMap<String, Project>>,
    updates: Mutex<Vec<(String, ProjectPatch)>>,
    gets: AtomicUsize,
    update_attempts: AtomicUsize,
    fail_updates: AtomicBool,
}

impl MemoryStore {
    pub fn with_project(id: &str, name: &str) -> Self {
        let store = Self::default();
        store
            .projects
            .lock()
            .unwrap()
            .insert(id.to_string(), Project::new(id, name));
        store
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn update_attempts(&self) -> usize {
        self.update_attempts.load(Ordering::SeqCst)
    }

    /// Successful updates, in order.
    pub fn updates(&self) -> Vec<(String, ProjectPatch)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn stored(&self, id: &str) -> Option<Project> {
        self.projects.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.projects.lock().unwrap().values().cloned().collect())
    }

    async fn create_project(&self, name: &str) -> Result<Project> {
        let name = validate_name(name)?;
        let mut projects = self.projects.lock().unwrap();
        let id = format!("proj-{}", projects.len() + 1);
        let project = Project::new(&id, name);
        projects.insert(id, project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: &str) -> Result<Project> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.stored(id)
            .ok_or_else(|| DashError::ProjectNotFound(id.to_string()))
    }

    async fn update_project(&self, id: &str, patch: ProjectPatch) -> Result<Project> {
        self.update_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(DashError::Store("simulated outage".into()));
        }
        let patch = patch.validated()?;
        let mut projects = self.projects.lock().unwrap();
        let project = projects
            .get_mut(id)
            .ok_or_else(|| DashError::ProjectNotFound(id.to_string()))?;
        self.updates
            .lock()
            .unwrap()
            .push((id.to_string(), patch.clone()));
        patch.apply(project);
        Ok(project.clone())
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        self.projects
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DashError::ProjectNotFound(id.to_string()))
    }
}
