//! Error types for taskboard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, invalid config, unknown entity)
//! - 4: Operation failed (transport, API, serialization)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskboard CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskboard operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    // Operation failures (exit code 4)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}) on {method} {path}: {body}")]
    Api {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Store lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::ConfigNotFound(_)
            | Error::ProjectNotFound(_)
            | Error::TaskNotFound(_) => exit_codes::USER_ERROR,

            // Operation failures
            Error::Transport(_)
            | Error::Api { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockPoisoned(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured fields for machine-readable output.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Api {
                method,
                path,
                status,
                body,
            } => Some(serde_json::json!({
                "method": method,
                "path": path,
                "status": status,
                "body": body,
            })),
            Error::InvalidConfig(message) | Error::InvalidArgument(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            Error::ConfigNotFound(path) => Some(serde_json::json!({
                "path": path.to_string_lossy(),
            })),
            Error::ProjectNotFound(id) => Some(serde_json::json!({ "project_id": id })),
            Error::TaskNotFound(id) => Some(serde_json::json!({ "task_id": id })),
            _ => None,
        }
    }

    /// HTTP status carried by an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for taskboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
