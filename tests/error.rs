use std::path::PathBuf;

use serde_json::json;
use taskboard::error::{exit_codes, JsonError};
use taskboard::Error;

#[test]
fn user_errors_exit_with_two() {
    let errors = [
        Error::InvalidConfig("bad".to_string()),
        Error::InvalidArgument("bad".to_string()),
        Error::ConfigNotFound(PathBuf::from("missing.toml")),
        Error::ProjectNotFound("p1".to_string()),
        Error::TaskNotFound("t1".to_string()),
    ];
    for err in errors {
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR, "{err}");
    }
}

#[test]
fn operation_failures_exit_with_four() {
    let api = Error::Api {
        method: "PUT".to_string(),
        path: "/tasks/t1".to_string(),
        status: 500,
        body: "boom".to_string(),
    };
    assert_eq!(api.exit_code(), exit_codes::OPERATION_FAILED);
    assert_eq!(api.status(), Some(500));
    assert_eq!(
        Error::OperationFailed("x".to_string()).exit_code(),
        exit_codes::OPERATION_FAILED
    );
    assert_eq!(
        Error::LockPoisoned("store").exit_code(),
        exit_codes::OPERATION_FAILED
    );
}

#[test]
fn api_error_details_carry_request() {
    let err = Error::Api {
        method: "GET".to_string(),
        path: "/projects".to_string(),
        status: 503,
        body: "unavailable".to_string(),
    };
    assert_eq!(
        err.details(),
        Some(json!({
            "method": "GET",
            "path": "/projects",
            "status": 503,
            "body": "unavailable",
        }))
    );
    assert_eq!(
        err.to_string(),
        "API error (503) on GET /projects: unavailable"
    );
}

#[test]
fn json_error_mirrors_error() {
    let err = Error::TaskNotFound("t9".to_string());
    let value = serde_json::to_value(JsonError::from(&err)).expect("json");
    assert_eq!(
        value,
        json!({
            "error": "Task not found: t9",
            "code": 2,
            "details": { "task_id": "t9" },
        })
    );

    let value = serde_json::to_value(JsonError::from(&Error::OperationFailed("x".to_string())))
        .expect("json");
    assert!(value.get("details").is_none());
}
