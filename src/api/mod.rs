//! Request interface to the board REST API.
//!
//! This module provides:
//!
//! - [`Transport`]: trait for issuing `get`/`post`/`put`/`delete` over a resource path
//! - [`ApiClient`]: typed wrapper that decodes payloads into [`Envelope`]s
//! - [`ProjectsApi`], [`TasksApi`], [`UsersApi`]: per-resource endpoints
//! - [`http::HttpTransport`]: reqwest-backed transport
//! - [`memory::InMemoryTransport`]: in-process fake backend for tests

pub mod http;
pub mod memory;
mod resources;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

pub use resources::{ProjectsApi, TasksApi, UsersApi};

/// HTTP verbs used by the board API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful response with its payload under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

/// Generic request interface.
///
/// Implementations must treat non-2xx responses as errors. A response with
/// no body is reported as `Value::Null`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, method: Method, path: &str, body: Option<Value>)
        -> Result<Envelope<Value>>;
}

/// Typed client over a shared [`Transport`].
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>> {
        self.send(Method::Get, path, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<Envelope<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.send(Method::Post, path, Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<Envelope<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.send(Method::Put, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.transport.request(Method::Delete, path, None).await?;
        Ok(())
    }

    pub fn projects(&self) -> ProjectsApi {
        ProjectsApi::new(self.clone())
    }

    pub fn tasks(&self) -> TasksApi {
        TasksApi::new(self.clone())
    }

    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Envelope<T>> {
        let response = self.transport.request(method, path, body).await?;
        let data = serde_json::from_value(response.data)?;
        Ok(Envelope::new(data))
    }
}
