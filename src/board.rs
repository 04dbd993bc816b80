//! Composition root for the stores.
//!
//! A [`Board`] owns one instance of each store, wired so that task mutations
//! flow to the project status synchronizer. Independent boards share nothing.

use std::sync::Arc;

use serde::Serialize;

use crate::api::http::HttpTransport;
use crate::api::{ApiClient, Transport};
use crate::config::{Config, RollbackPolicy};
use crate::error::Result;
use crate::model::{Project, ProjectStatus};
use crate::status::derive_status;
use crate::store::{ProjectStore, TaskStore, UserStore};
use crate::sync::{ProjectStatusSynchronizer, ProjectSync};

/// Project row for list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub task_count: usize,
    /// Status the cached tasks imply; differs from `project.status` when the
    /// project has drifted.
    pub derived_status: ProjectStatus,
}

impl ProjectSummary {
    pub fn is_drifted(&self) -> bool {
        self.project.status != self.derived_status
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    projects: Arc<ProjectStore>,
    tasks: Arc<TaskStore>,
    users: Arc<UserStore>,
    synchronizer: Arc<ProjectStatusSynchronizer>,
}

impl Board {
    pub fn new(client: ApiClient, rollback: RollbackPolicy) -> Self {
        let projects = Arc::new(ProjectStore::new(client.projects()));
        let tasks = Arc::new(TaskStore::new(client.tasks(), rollback));
        let users = Arc::new(UserStore::new(client.users()));
        let synchronizer = Arc::new(ProjectStatusSynchronizer::new(Arc::clone(&projects)));
        tasks.subscribe(synchronizer.clone());

        Self {
            projects,
            tasks,
            users,
            synchronizer,
        }
    }

    pub fn with_transport(transport: Arc<dyn Transport>, rollback: RollbackPolicy) -> Self {
        Self::new(ApiClient::new(transport), rollback)
    }

    /// Board talking HTTP to `config.api.base_url`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.api)?;
        Ok(Self::with_transport(Arc::new(transport), config.tasks.rollback))
    }

    pub fn projects(&self) -> &ProjectStore {
        &self.projects
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    pub fn synchronizer(&self) -> &ProjectStatusSynchronizer {
        &self.synchronizer
    }

    /// Fetch users, tasks and projects concurrently.
    pub async fn load(&self) {
        tokio::join!(
            self.users.fetch_all(),
            self.tasks.fetch_all(),
            self.projects.fetch_all(),
        );
    }

    /// Errors currently recorded by any store.
    pub fn errors(&self) -> Vec<String> {
        [self.users.error(), self.tasks.error(), self.projects.error()]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Explicitly correct every cached project's status.
    pub async fn reconcile_all(&self) -> Vec<ProjectSync> {
        self.synchronizer.reconcile_all(&self.tasks).await
    }

    pub fn project_summaries(&self) -> Vec<ProjectSummary> {
        self.projects
            .projects()
            .into_iter()
            .map(|project| {
                let tasks = self.tasks.tasks_by_project(&project.id);
                ProjectSummary {
                    task_count: tasks.len(),
                    derived_status: derive_status(&tasks),
                    project,
                }
            })
            .collect()
    }

    pub fn clear(&self) {
        self.users.clear();
        self.tasks.clear();
        self.projects.clear();
    }
}
