//! Per-resource endpoints.

use crate::error::Result;
use crate::model::{NewProject, NewTask, Project, ProjectPatch, Task, TaskPatch, User};

use super::{ApiClient, Envelope};

const PROJECTS: &str = "/projects";
const TASKS: &str = "/tasks";
const USERS: &str = "/users";

fn item_path(collection: &str, id: &str) -> String {
    format!("{collection}/{id}")
}

#[derive(Debug, Clone)]
pub struct ProjectsApi {
    client: ApiClient,
}

impl ProjectsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_all(&self) -> Result<Envelope<Vec<Project>>> {
        self.client.get(PROJECTS).await
    }

    pub async fn get(&self, project_id: &str) -> Result<Envelope<Project>> {
        self.client.get(&item_path(PROJECTS, project_id)).await
    }

    pub async fn create(&self, project: &NewProject) -> Result<Envelope<Project>> {
        self.client.post(PROJECTS, project).await
    }

    /// Send the full project; the server replaces the stored entity.
    pub async fn replace(&self, project: &Project) -> Result<Envelope<Project>> {
        self.client.put(&item_path(PROJECTS, &project.id), project).await
    }

    pub async fn update(&self, project_id: &str, patch: &ProjectPatch) -> Result<Envelope<Project>> {
        self.client.put(&item_path(PROJECTS, project_id), patch).await
    }

    pub async fn delete(&self, project_id: &str) -> Result<()> {
        self.client.delete(&item_path(PROJECTS, project_id)).await
    }
}

#[derive(Debug, Clone)]
pub struct TasksApi {
    client: ApiClient,
}

impl TasksApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_all(&self) -> Result<Envelope<Vec<Task>>> {
        self.client.get(TASKS).await
    }

    pub async fn get(&self, task_id: &str) -> Result<Envelope<Task>> {
        self.client.get(&item_path(TASKS, task_id)).await
    }

    pub async fn create(&self, task: &NewTask) -> Result<Envelope<Task>> {
        self.client.post(TASKS, task).await
    }

    pub async fn update(&self, task_id: &str, patch: &TaskPatch) -> Result<Envelope<Task>> {
        self.client.put(&item_path(TASKS, task_id), patch).await
    }

    pub async fn delete(&self, task_id: &str) -> Result<()> {
        self.client.delete(&item_path(TASKS, task_id)).await
    }
}

#[derive(Debug, Clone)]
pub struct UsersApi {
    client: ApiClient,
}

impl UsersApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_all(&self) -> Result<Envelope<Vec<User>>> {
        self.client.get(USERS).await
    }
}
