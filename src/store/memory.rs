use std::sync::{Mutex, MutexGuard};

use super::storage::WorkspaceData;
use crate::error::ScoreError;
use crate::snapshot::ProjectSnapshot;
use crate::sync::{HealthStore, WorkspaceSettings};

/// A [`HealthStore`] over a single in-memory workspace document.
#[derive(Debug)]
pub struct MemoryStore {
    data: Mutex<WorkspaceData>,
}

impl MemoryStore {
    pub fn new(data: WorkspaceData) -> Self {
        Self {
            data: Mutex::new(data),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, WorkspaceData>, ScoreError> {
        self.data
            .lock()
            .map_err(|_| ScoreError::Store("workspace lock poisoned".to_string()))
    }

    fn workspace<'a>(
        guard: &'a MutexGuard<'_, WorkspaceData>,
        workspace_id: &str,
    ) -> Result<&'a WorkspaceData, ScoreError> {
        if guard.id == workspace_id {
            Ok(&**guard)
        } else {
            Err(ScoreError::Store(format!("unknown workspace '{}'", workspace_id)))
        }
    }

    /// Copy of the current document, e.g. to write it back to disk.
    pub fn snapshot(&self) -> Result<WorkspaceData, ScoreError> {
        Ok(self.lock()?.clone())
    }

    pub fn into_inner(self) -> Result<WorkspaceData, ScoreError> {
        self.data
            .into_inner()
            .map_err(|_| ScoreError::Store("workspace lock poisoned".to_string()))
    }
}

impl HealthStore for MemoryStore {
    async fn workspace_settings(&self, workspace_id: &str) -> Result<WorkspaceSettings, ScoreError> {
        let guard = self.lock()?;
        let workspace = Self::workspace(&guard, workspace_id)?;
        Ok(workspace.settings.clone())
    }

    async fn list_projects(&self, workspace_id: &str) -> Result<Vec<String>, ScoreError> {
        let guard = self.lock()?;
        let workspace = Self::workspace(&guard, workspace_id)?;
        let ids = workspace.projects.iter().map(|p| p.subject.id.clone()).collect();
        Ok(ids)
    }

    async fn load_project(&self, project_id: &str) -> Result<Option<ProjectSnapshot>, ScoreError> {
        let guard = self.lock()?;
        let project = guard.projects.iter().find(|p| p.subject.id == project_id).cloned();
        Ok(project)
    }

    async fn save_project_score(&self, project_id: &str, score: u8) -> Result<(), ScoreError> {
        let mut guard = self.lock()?;
        let project = guard.projects.iter_mut().find(|p| p.subject.id == project_id);
        match project {
            Some(project) => {
                project.subject.health_score = Some(score);
                Ok(())
            }
            None => Err(ScoreError::Store(format!("unknown project '{}'", project_id))),
        }
    }
}
