//! Task cache.
//!
//! After every successful mutation the store publishes a [`TaskChange`]
//! carrying the affected project's current tasks. It never calls into the
//! project store directly; see [`crate::sync`].

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, info, warn};

use crate::api::TasksApi;
use crate::config::RollbackPolicy;
use crate::error::Result;
use crate::model::{NewTask, ProjectId, Task, TaskPatch, TaskStatus};
use crate::sync::{TaskChange, TaskChangeKind, TaskChangeListener};

use super::{read, write, Cache};

const FETCH_FAILED: &str = "Failed to fetch tasks";
const FETCH_ONE_FAILED: &str = "Failed to fetch task";
const CREATE_FAILED: &str = "Failed to create task";
const UPDATE_FAILED: &str = "Failed to update task";
const DELETE_FAILED: &str = "Failed to delete task";

pub struct TaskStore {
    api: TasksApi,
    rollback: RollbackPolicy,
    state: RwLock<Cache<Task>>,
    listeners: RwLock<Vec<Arc<dyn TaskChangeListener>>>,
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("rollback", &self.rollback)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TaskStore {
    pub fn new(api: TasksApi, rollback: RollbackPolicy) -> Self {
        Self {
            api,
            rollback,
            state: RwLock::new(Cache::default()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener for task mutations.
    pub fn subscribe(&self, listener: Arc<dyn TaskChangeListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Load every task. Failures are recorded in [`Self::error`] and the
    /// previous cache is kept.
    pub async fn fetch_all(&self) {
        write(&self.state).begin_load();
        let result = self.api.get_all().await;

        let mut state = write(&self.state);
        state.loading = false;
        match result {
            Ok(envelope) => {
                debug!(count = envelope.data.len(), "tasks fetched");
                state.items = envelope.data;
            }
            Err(err) => {
                error!(error = %err, "{FETCH_FAILED}");
                state.error = Some(FETCH_FAILED.to_string());
            }
        }
    }

    /// Load a single task and upsert it into the cache.
    pub async fn fetch_one(&self, task_id: &str) -> Result<Task> {
        match self.api.get(task_id).await {
            Ok(envelope) => {
                let task = envelope.data;
                let mut state = write(&self.state);
                match state.items.iter_mut().find(|cached| cached.id == task.id) {
                    Some(cached) => *cached = task.clone(),
                    None => state.items.push(task.clone()),
                }
                Ok(task)
            }
            Err(err) => Err(self.record_failure(FETCH_ONE_FAILED, err)),
        }
    }

    /// Create a task, cache the server copy and notify listeners.
    pub async fn create(&self, task: NewTask) -> Result<Task> {
        let created = match self.api.create(&task).await {
            Ok(envelope) => envelope.data,
            Err(err) => return Err(self.record_failure(CREATE_FAILED, err)),
        };
        write(&self.state).items.push(created.clone());
        info!(task_id = %created.id, project_id = %created.project_id, "task created");

        self.notify(TaskChangeKind::Created, &created.id, &created.project_id)
            .await;
        Ok(created)
    }

    /// Optimistically apply `patch`, persist it, then notify listeners.
    ///
    /// Returns `Ok(None)` without calling the API when the task is not
    /// cached. On failure the local change is rolled back according to the
    /// configured [`RollbackPolicy`].
    pub async fn update(&self, task_id: &str, patch: TaskPatch) -> Result<Option<Task>> {
        let previous = {
            let mut state = write(&self.state);
            let Some(cached) = state.items.iter_mut().find(|task| task.id == task_id) else {
                debug!(task_id, "task not cached; skipping update");
                return Ok(None);
            };
            let previous = cached.clone();
            cached.merge(&patch);
            previous
        };

        let updated = match self.api.update(task_id, &patch).await {
            Ok(envelope) => envelope.data,
            Err(err) => {
                self.roll_back(previous).await;
                return Err(self.record_failure(UPDATE_FAILED, err));
            }
        };

        {
            let mut state = write(&self.state);
            if let Some(cached) = state.items.iter_mut().find(|task| task.id == task_id) {
                *cached = updated.clone();
            }
        }
        info!(task_id, status = %updated.status, "task updated");

        self.notify(TaskChangeKind::Updated, &updated.id, &updated.project_id)
            .await;
        if previous.project_id != updated.project_id {
            self.notify(TaskChangeKind::Moved, &updated.id, &previous.project_id)
                .await;
        }
        Ok(Some(updated))
    }

    /// Delete a cached task. Unknown ids are a no-op.
    pub async fn delete(&self, task_id: &str) -> Result<Option<Task>> {
        let Some(task) = self.get_by_id(task_id) else {
            debug!(task_id, "task not cached; skipping delete");
            return Ok(None);
        };

        if let Err(err) = self.api.delete(task_id).await {
            return Err(self.record_failure(DELETE_FAILED, err));
        }
        write(&self.state).items.retain(|cached| cached.id != task_id);
        info!(task_id, project_id = %task.project_id, "task deleted");

        self.notify(TaskChangeKind::Deleted, &task.id, &task.project_id)
            .await;
        Ok(Some(task))
    }

    /// Tasks of one project, in cache order.
    pub fn tasks_by_project(&self, project_id: &str) -> Vec<Task> {
        read(&self.state)
            .items
            .iter()
            .filter(|task| task.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn tasks_by_project_and_status(&self, project_id: &str, status: TaskStatus) -> Vec<Task> {
        read(&self.state)
            .items
            .iter()
            .filter(|task| task.project_id == project_id && task.status == status)
            .cloned()
            .collect()
    }

    pub fn tasks(&self) -> Vec<Task> {
        read(&self.state).items.clone()
    }

    pub fn get_by_id(&self, task_id: &str) -> Option<Task> {
        read(&self.state)
            .items
            .iter()
            .find(|task| task.id == task_id)
            .cloned()
    }

    pub fn is_loading(&self) -> bool {
        read(&self.state).loading
    }

    pub fn error(&self) -> Option<String> {
        read(&self.state).error.clone()
    }

    /// Reset cache, loading flag and error.
    pub fn clear(&self) {
        *write(&self.state) = Cache::default();
    }

    async fn roll_back(&self, previous: Task) {
        match self.rollback {
            RollbackPolicy::Restore => {
                let mut state = write(&self.state);
                if let Some(cached) = state.items.iter_mut().find(|task| task.id == previous.id) {
                    *cached = previous;
                }
            }
            RollbackPolicy::Refetch => {
                warn!(task_id = %previous.id, "re-fetching tasks after failed update");
                self.fetch_all().await;
            }
        }
    }

    fn record_failure(&self, message: &str, err: crate::error::Error) -> crate::error::Error {
        error!(error = %err, "{message}");
        write(&self.state).error = Some(message.to_string());
        err
    }

    async fn notify(&self, kind: TaskChangeKind, task_id: &str, project_id: &ProjectId) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if listeners.is_empty() {
            return;
        }

        let change = TaskChange {
            kind,
            task_id: task_id.to_string(),
            project_id: project_id.clone(),
            tasks: self.tasks_by_project(project_id),
        };
        for listener in listeners {
            listener.task_changed(&change).await;
        }
    }
}
