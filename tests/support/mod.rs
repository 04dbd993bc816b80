#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use taskboard::api::memory::{InMemoryTransport, RecordedRequest};
use taskboard::api::Method;
use taskboard::config::RollbackPolicy;
use taskboard::model::{Project, ProjectStatus, Task, TaskStatus, User};
use taskboard::Board;

/// Board wired to an in-memory backend the test can inspect.
pub struct TestBoard {
    pub backend: Arc<InMemoryTransport>,
    pub board: Board,
}

impl TestBoard {
    pub fn new() -> Self {
        Self::with_rollback(RollbackPolicy::Restore)
    }

    pub fn with_rollback(rollback: RollbackPolicy) -> Self {
        let backend = Arc::new(InMemoryTransport::new());
        let board = Board::with_transport(backend.clone(), rollback);
        Self { backend, board }
    }

    pub fn seed_project(&self, id: &str, status: ProjectStatus) -> Project {
        let project = project(id, status);
        self.backend.seed("projects", &project).expect("seed project");
        project
    }

    pub fn seed_task(&self, id: &str, project_id: &str, status: TaskStatus) -> Task {
        let task = task(id, project_id, status);
        self.backend.seed("tasks", &task).expect("seed task");
        task
    }

    pub fn seed_user(&self, id: &str, name: &str) -> User {
        let user = User {
            id: id.to_string(),
            name: name.to_string(),
        };
        self.backend.seed("users", &user).expect("seed user");
        user
    }

    pub fn requests(&self, method: Method, path_prefix: &str) -> Vec<RecordedRequest> {
        self.backend
            .requests_matching(method, path_prefix)
            .expect("requests")
    }

    pub fn server_projects(&self) -> Vec<Project> {
        self.backend.snapshot("projects").expect("snapshot")
    }

    pub fn server_tasks(&self) -> Vec<Task> {
        self.backend.snapshot("tasks").expect("snapshot")
    }
}

pub fn project(id: &str, status: ProjectStatus) -> Project {
    Project {
        id: id.to_string(),
        name: format!("Project {id}"),
        description: None,
        status,
        created_at: Utc
            .timestamp_millis_opt(1_700_000_000_000)
            .single()
            .expect("timestamp"),
    }
}

pub fn task(id: &str, project_id: &str, status: TaskStatus) -> Task {
    Task {
        id: id.to_string(),
        project_id: project_id.to_string(),
        name: format!("Task {id}"),
        status,
        assigned_to: None,
        end_date: None,
        order: None,
    }
}
