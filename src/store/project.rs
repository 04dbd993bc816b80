//! Project cache and status reconciliation.

use std::borrow::Cow;
use std::sync::RwLock;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::api::ProjectsApi;
use crate::error::Result;
use crate::model::{NewProject, Project, ProjectStatus, Task};
use crate::status::reconcile;

use super::{read, write, Cache};

const FETCH_FAILED: &str = "Failed to fetch projects";
const FETCH_ONE_FAILED: &str = "Failed to fetch project";
const CREATE_FAILED: &str = "Failed to create project";
const DELETE_FAILED: &str = "Failed to delete project";
const SYNC_FAILED: &str = "Failed to update project status";

/// Result of reconciling one project's status with its tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Project is not cached; nothing was done.
    Missing,
    /// Derived status already matches; no request was sent.
    Unchanged { status: ProjectStatus },
    /// Status was persisted. `to` is the status the server returned.
    Updated {
        from: ProjectStatus,
        to: ProjectStatus,
    },
    /// Persisting failed; the cached status was left as it was.
    Failed {
        status: ProjectStatus,
        message: String,
    },
}

impl SyncOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, SyncOutcome::Updated { .. })
    }
}

#[derive(Debug)]
pub struct ProjectStore {
    api: ProjectsApi,
    state: RwLock<Cache<Project>>,
}

impl ProjectStore {
    pub fn new(api: ProjectsApi) -> Self {
        Self {
            api,
            state: RwLock::new(Cache::default()),
        }
    }

    /// Load every project as the server reports it.
    ///
    /// Statuses are not reconciled here; that only happens through
    /// [`Self::sync_project_status`].
    pub async fn fetch_all(&self) {
        write(&self.state).begin_load();
        let result = self.api.get_all().await;

        let mut state = write(&self.state);
        state.loading = false;
        match result {
            Ok(envelope) => {
                debug!(count = envelope.data.len(), "projects fetched");
                state.items = envelope.data;
            }
            Err(err) => {
                error!(error = %err, "{FETCH_FAILED}");
                state.error = Some(FETCH_FAILED.to_string());
            }
        }
    }

    /// Load a single project and upsert it into the cache.
    pub async fn fetch_one(&self, project_id: &str) -> Result<Project> {
        match self.api.get(project_id).await {
            Ok(envelope) => {
                let project = envelope.data;
                self.upsert(project.clone());
                Ok(project)
            }
            Err(err) => Err(self.record_failure(FETCH_ONE_FAILED, err)),
        }
    }

    pub async fn create(&self, project: NewProject) -> Result<Project> {
        match self.api.create(&project).await {
            Ok(envelope) => {
                let created = envelope.data;
                write(&self.state).items.push(created.clone());
                info!(project_id = %created.id, "project created");
                Ok(created)
            }
            Err(err) => Err(self.record_failure(CREATE_FAILED, err)),
        }
    }

    /// Recompute a project's status from `tasks` and persist it if it moved.
    ///
    /// Never returns an error: failures are logged, recorded in
    /// [`Self::error`] and reported as [`SyncOutcome::Failed`].
    pub async fn sync_project_status(&self, project_id: &str, tasks: &[Task]) -> SyncOutcome {
        let Some(project) = self.get_by_id(project_id) else {
            debug!(project_id, "project not cached; skipping status sync");
            return SyncOutcome::Missing;
        };
        let Cow::Owned(next) = reconcile(&project, tasks) else {
            debug!(project_id, status = %project.status, "project status up to date");
            return SyncOutcome::Unchanged {
                status: project.status,
            };
        };

        let from = project.status;
        match self.api.replace(&next).await {
            Ok(envelope) => {
                let saved = envelope.data;
                let to = saved.status;
                self.upsert(saved);
                info!(project_id, %from, %to, "project status updated");
                SyncOutcome::Updated { from, to }
            }
            Err(err) => {
                warn!(project_id, error = %err, "{SYNC_FAILED}");
                write(&self.state).error = Some(SYNC_FAILED.to_string());
                SyncOutcome::Failed {
                    status: from,
                    message: err.to_string(),
                }
            }
        }
    }

    pub async fn delete(&self, project_id: &str) -> Result<()> {
        if let Err(err) = self.api.delete(project_id).await {
            return Err(self.record_failure(DELETE_FAILED, err));
        }
        write(&self.state)
            .items
            .retain(|project| project.id != project_id);
        info!(project_id, "project deleted");
        Ok(())
    }

    pub fn get_by_id(&self, project_id: &str) -> Option<Project> {
        read(&self.state)
            .items
            .iter()
            .find(|project| project.id == project_id)
            .cloned()
    }

    pub fn projects(&self) -> Vec<Project> {
        read(&self.state).items.clone()
    }

    pub fn is_loading(&self) -> bool {
        read(&self.state).loading
    }

    pub fn error(&self) -> Option<String> {
        read(&self.state).error.clone()
    }

    pub fn clear(&self) {
        *write(&self.state) = Cache::default();
    }

    fn upsert(&self, project: Project) {
        let mut state = write(&self.state);
        match state.items.iter_mut().find(|cached| cached.id == project.id) {
            Some(cached) => *cached = project,
            None => state.items.push(project),
        }
    }

    fn record_failure(&self, message: &str, err: crate::error::Error) -> crate::error::Error {
        error!(error = %err, "{message}");
        write(&self.state).error = Some(message.to_string());
        err
    }
}
