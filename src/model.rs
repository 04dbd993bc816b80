//! Domain entities exchanged with the board API.
//!
//! Wire format is camelCase JSON; timestamps are millisecond Unix epochs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

pub type ProjectId = String;
pub type TaskId = String;
pub type UserId = String;

/// Aggregate status of a project, derived from its tasks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    New,
    InProgress,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::New => "new",
            ProjectStatus::InProgress => "in-progress",
            ProjectStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow status of a single task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    New,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(TaskStatus::New),
            "in-progress" | "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(Error::InvalidArgument(format!(
                "unknown task status '{other}' (expected new|in-progress|done)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ProjectStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Copy of this project with `status` replaced.
    pub fn with_status(&self, status: ProjectStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// Project payload for `POST /projects`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ProjectStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl NewProject {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
            status: ProjectStatus::New,
            created_at: Utc::now(),
        }
    }
}

/// Partial project payload for `PUT /projects/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub name: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl Task {
    /// Apply a partial update in place.
    pub fn merge(&mut self, patch: &TaskPatch) {
        if let Some(project_id) = &patch.project_id {
            self.project_id = project_id.clone();
        }
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(assigned_to) = &patch.assigned_to {
            self.assigned_to = assigned_to.clone();
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(order) = patch.order {
            self.order = Some(order);
        }
    }
}

/// Task payload for `POST /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub project_id: ProjectId,
    pub name: String,
    pub status: TaskStatus,
    pub assigned_to: Option<UserId>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl NewTask {
    pub fn new(project_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            name: name.into(),
            status: TaskStatus::New,
            assigned_to: None,
            end_date: None,
            order: None,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}

/// Partial task payload for `PUT /tasks/{id}`.
///
/// `assigned_to` and `end_date` are doubly optional: the outer `None` leaves
/// the field alone, `Some(None)` sends an explicit `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub assigned_to: Option<Option<UserId>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_end_date",
        deserialize_with = "deserialize_end_date"
    )]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &TaskPatch::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn serialize_end_date<S>(
    value: &Option<Option<DateTime<Utc>>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(Some(date)) => serializer.serialize_i64(date.timestamp_millis()),
        _ => serializer.serialize_none(),
    }
}

fn deserialize_end_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = Option::<i64>::deserialize(deserializer)?;
    match millis {
        None => Ok(Some(None)),
        Some(value) => DateTime::<Utc>::from_timestamp_millis(value)
            .map(|date| Some(Some(date)))
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {value}"))),
    }
}
