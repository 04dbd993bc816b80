//! Task-to-project status propagation.
//!
//! The task store publishes [`TaskChange`]s; [`ProjectStatusSynchronizer`]
//! subscribes and asks the project store to reconcile. Neither store knows
//! about the other.
//!
//! Two changes for the same project in flight at once are not ordered: the
//! last sync to finish wins, which may not reflect the final task state until
//! the next change or an explicit [`ProjectStatusSynchronizer::reconcile_all`].

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::Serialize;

use crate::model::{ProjectId, Task, TaskId};
use crate::store::{ProjectStore, SyncOutcome, TaskStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskChangeKind {
    Created,
    Updated,
    Deleted,
    /// The task left this project for another one.
    Moved,
}

/// "Tasks changed for project X", with that project's tasks after the change.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskChange {
    pub kind: TaskChangeKind,
    pub task_id: TaskId,
    pub project_id: ProjectId,
    pub tasks: Vec<Task>,
}

#[async_trait]
pub trait TaskChangeListener: Send + Sync {
    async fn task_changed(&self, change: &TaskChange);
}

/// Outcome of one project's reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSync {
    pub project_id: ProjectId,
    #[serde(flatten)]
    pub outcome: SyncOutcome,
}

/// Keeps project statuses in line with task changes.
#[derive(Debug)]
pub struct ProjectStatusSynchronizer {
    projects: Arc<ProjectStore>,
    last: RwLock<Option<ProjectSync>>,
}

impl ProjectStatusSynchronizer {
    pub fn new(projects: Arc<ProjectStore>) -> Self {
        Self {
            projects,
            last: RwLock::new(None),
        }
    }

    /// The most recent sync triggered by a task change.
    pub fn last_outcome(&self) -> Option<ProjectSync> {
        self.last
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reconcile every cached project against the task store's cache.
    pub async fn reconcile_all(&self, tasks: &TaskStore) -> Vec<ProjectSync> {
        let mut results = Vec::new();
        for project in self.projects.projects() {
            let project_tasks = tasks.tasks_by_project(&project.id);
            let outcome = self
                .projects
                .sync_project_status(&project.id, &project_tasks)
                .await;
            results.push(ProjectSync {
                project_id: project.id,
                outcome,
            });
        }
        results
    }
}

#[async_trait]
impl TaskChangeListener for ProjectStatusSynchronizer {
    async fn task_changed(&self, change: &TaskChange) {
        let outcome = self
            .projects
            .sync_project_status(&change.project_id, &change.tasks)
            .await;
        *self.last.write().unwrap_or_else(PoisonError::into_inner) = Some(ProjectSync {
            project_id: change.project_id.clone(),
            outcome,
        });
    }
}
