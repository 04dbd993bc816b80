//! In-memory transport for testing.
//!
//! [`InMemoryTransport`] behaves like a small REST backend serving
//! `/projects`, `/tasks` and `/users`. Every request is recorded so tests can
//! assert on the exact calls a store made, and failures can be injected per
//! method and path prefix.
//!
//! ## Limitations
//!
//! - **NOT suitable for production**: No persistence, no validation
//! - **Shallow updates**: `PUT` merges top-level fields only

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use ulid::Ulid;

use super::{Envelope, Method, Transport};
use crate::error::{Error, Result};

const COLLECTIONS: [&str; 3] = ["projects", "tasks", "users"];

/// A request observed by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct FailureRule {
    method: Method,
    path_prefix: String,
    status: u16,
    remaining: Option<usize>,
}

impl FailureRule {
    fn matches(&self, method: Method, path: &str) -> bool {
        self.method == method && path.starts_with(&self.path_prefix)
    }
}

#[derive(Debug, Default)]
struct BackendState {
    collections: HashMap<String, Vec<Value>>,
    requests: Vec<RecordedRequest>,
    failures: Vec<FailureRule>,
}

/// Fake REST backend.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    state: RwLock<BackendState>,
}

fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::LockPoisoned("in-memory transport")
}

fn api_error(method: Method, path: &str, status: u16, body: impl Into<String>) -> Error {
    Error::Api {
        method: method.to_string(),
        path: path.to_string(),
        status,
        body: body.into(),
    }
}

fn entity_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entity directly, bypassing the request log.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not serialize to an object with a
    /// string `id`.
    pub fn seed<T: Serialize>(&self, collection: &str, entity: &T) -> Result<()> {
        let value = serde_json::to_value(entity)?;
        if entity_id(&value).is_none() {
            return Err(Error::InvalidArgument(format!(
                "seeded {collection} entity has no string id"
            )));
        }
        let mut state = self.state.write().map_err(poison_err)?;
        let items = state.collections.entry(collection.to_string()).or_default();
        items.retain(|item| entity_id(item) != entity_id(&value));
        items.push(value);
        Ok(())
    }

    /// Current server-side contents of a collection.
    pub fn snapshot<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        let state = self.state.read().map_err(poison_err)?;
        let items = state.collections.get(collection).cloned().unwrap_or_default();
        drop(state);
        items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(Error::from))
            .collect()
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Result<Vec<RecordedRequest>> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state.requests.clone())
    }

    /// Requests with the given method whose path starts with `path_prefix`.
    pub fn requests_matching(&self, method: Method, path_prefix: &str) -> Result<Vec<RecordedRequest>> {
        Ok(self
            .requests()?
            .into_iter()
            .filter(|request| request.method == method && request.path.starts_with(path_prefix))
            .collect())
    }

    pub fn clear_requests(&self) -> Result<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.requests.clear();
        Ok(())
    }

    /// Fail the next matching request with `status`.
    pub fn fail_next(&self, method: Method, path_prefix: &str, status: u16) -> Result<()> {
        self.push_failure(method, path_prefix, status, Some(1))
    }

    /// Fail every matching request with `status` until [`Self::clear_failures`].
    pub fn fail_always(&self, method: Method, path_prefix: &str, status: u16) -> Result<()> {
        self.push_failure(method, path_prefix, status, None)
    }

    pub fn clear_failures(&self) -> Result<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.failures.clear();
        Ok(())
    }

    fn push_failure(
        &self,
        method: Method,
        path_prefix: &str,
        status: u16,
        remaining: Option<usize>,
    ) -> Result<()> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.failures.push(FailureRule {
            method,
            path_prefix: path_prefix.to_string(),
            status,
            remaining,
        });
        Ok(())
    }
}

impl BackendState {
    fn take_failure(&mut self, method: Method, path: &str) -> Option<u16> {
        let index = self
            .failures
            .iter()
            .position(|rule| rule.matches(method, path))?;
        let rule = &mut self.failures[index];
        let status = rule.status;
        if let Some(remaining) = rule.remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                self.failures.remove(index);
            }
        }
        Some(status)
    }

    fn handle(&mut self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let mut segments = path.trim_matches('/').splitn(2, '/');
        let collection = segments.next().unwrap_or_default();
        let id = segments.next().filter(|id| !id.is_empty());

        if !COLLECTIONS.contains(&collection) {
            return Err(api_error(method, path, 404, "unknown resource"));
        }
        let items = self.collections.entry(collection.to_string()).or_default();

        match (method, id) {
            (Method::Get, None) => Ok(Value::Array(items.clone())),
            (Method::Get, Some(id)) => items
                .iter()
                .find(|item| entity_id(item) == Some(id))
                .cloned()
                .ok_or_else(|| api_error(method, path, 404, "not found")),
            (Method::Post, None) => {
                let Some(Value::Object(mut fields)) = body else {
                    return Err(api_error(method, path, 400, "expected JSON object"));
                };
                fields.insert(
                    "id".to_string(),
                    Value::String(Ulid::new().to_string().to_lowercase()),
                );
                let created = Value::Object(fields);
                items.push(created.clone());
                Ok(created)
            }
            (Method::Put, Some(id)) => {
                let Some(Value::Object(fields)) = body else {
                    return Err(api_error(method, path, 400, "expected JSON object"));
                };
                let existing = items
                    .iter_mut()
                    .find(|item| entity_id(item) == Some(id))
                    .ok_or_else(|| api_error(method, path, 404, "not found"))?;
                let merged = existing.as_object_mut().map(|current| {
                    for (key, value) in fields {
                        if key != "id" {
                            current.insert(key, value);
                        }
                    }
                    current.clone()
                });
                Ok(Value::Object(merged.unwrap_or_else(Map::new)))
            }
            (Method::Delete, Some(id)) => {
                let before = items.len();
                items.retain(|item| entity_id(item) != Some(id));
                if items.len() == before {
                    return Err(api_error(method, path, 404, "not found"));
                }
                Ok(Value::Null)
            }
            _ => Err(api_error(method, path, 405, "method not allowed")),
        }
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Envelope<Value>> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.requests.push(RecordedRequest {
            method,
            path: path.to_string(),
            body: body.clone(),
        });
        if let Some(status) = state.take_failure(method, path) {
            return Err(api_error(method, path, status, "injected failure"));
        }
        let data = state.handle(method, path, body)?;
        Ok(Envelope::new(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn post_assigns_id_and_get_returns_it() -> Result<()> {
        let backend = InMemoryTransport::new();
        let created = backend
            .request(Method::Post, "/users", Some(json!({ "name": "Ann" })))
            .await?
            .into_data();
        let id = created["id"].as_str().expect("id").to_string();

        let fetched = backend
            .request(Method::Get, &format!("/users/{id}"), None)
            .await?
            .into_data();
        assert_eq!(fetched["name"], json!("Ann"));
        assert_eq!(backend.requests()?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn put_merges_top_level_fields() -> Result<()> {
        let backend = InMemoryTransport::new();
        backend.seed("tasks", &json!({ "id": "t1", "name": "A", "status": "new" }))?;
        let updated = backend
            .request(Method::Put, "/tasks/t1", Some(json!({ "status": "done", "id": "x" })))
            .await?
            .into_data();
        assert_eq!(updated, json!({ "id": "t1", "name": "A", "status": "done" }));
        Ok(())
    }

    #[tokio::test]
    async fn fail_next_fires_once() -> Result<()> {
        let backend = InMemoryTransport::new();
        backend.fail_next(Method::Get, "/projects", 503)?;

        let err = backend
            .request(Method::Get, "/projects", None)
            .await
            .expect_err("injected failure");
        assert_eq!(err.status(), Some(503));

        backend.request(Method::Get, "/projects", None).await?;
        Ok(())
    }

    #[tokio::test]
    async fn missing_entities_are_404() {
        let backend = InMemoryTransport::new();
        let err = backend
            .request(Method::Delete, "/tasks/nope", None)
            .await
            .expect_err("missing");
        assert_eq!(err.status(), Some(404));

        let err = backend
            .request(Method::Get, "/widgets", None)
            .await
            .expect_err("unknown collection");
        assert_eq!(err.status(), Some(404));
    }
}
