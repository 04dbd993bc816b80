//! reqwest-backed transport for the board API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{Error, Result};

use super::{Envelope, Method, Transport};

/// Transport that talks to a live REST backend.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport from API configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Envelope<Value>> {
        let url = self.url(path);
        debug!(%method, %url, "api request");

        let mut req = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(body) = &body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("json"));
        let bytes = response.bytes().await?;
        decode_body(&bytes, is_json).map(Envelope::new)
    }
}

/// Empty bodies and non-JSON acknowledgements (`200 OK` as text) are `null`.
/// A body the server labels as JSON must parse.
fn decode_body(bytes: &[u8], is_json: bool) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(err) if is_json => Err(Error::Json(err)),
        Err(_) => {
            debug!(len = bytes.len(), "ignoring non-JSON response body");
            Ok(Value::Null)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::api::ApiClient;
    use crate::config::RollbackPolicy;
    use crate::store::TaskStore;

    fn response(status: &str, content_type: Option<&str>, body: &str) -> String {
        let mut raw = format!("HTTP/1.1 {status}\r\nConnection: close\r\n");
        if let Some(content_type) = content_type {
            raw.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        raw.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
        raw
    }

    /// Answer one connection per canned response, in order.
    async fn serve(responses: Vec<String>) -> HttpTransport {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            for reply in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        transport_for(&format!("http://{addr}"))
    }

    fn transport_for(base_url: &str) -> HttpTransport {
        HttpTransport::new(&ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        })
        .expect("transport")
    }

    #[test]
    fn url_joins_without_duplicate_slashes() {
        let transport = transport_for("http://localhost:3000/");
        assert_eq!(transport.base_url(), "http://localhost:3000");
        assert_eq!(transport.url("/tasks/1"), "http://localhost:3000/tasks/1");
        assert_eq!(transport.url("users"), "http://localhost:3000/users");
    }

    #[tokio::test]
    async fn json_body_is_decoded() -> Result<()> {
        let transport = serve(vec![response(
            "200 OK",
            Some("application/json; charset=utf-8"),
            r#"[{"id":"u1","name":"Ann"}]"#,
        )])
        .await;

        let users = ApiClient::new(Arc::new(transport))
            .users()
            .get_all()
            .await?
            .into_data();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Ann");
        Ok(())
    }

    #[tokio::test]
    async fn text_acknowledgement_is_null() -> Result<()> {
        let transport = serve(vec![response("200 OK", Some("text/plain"), "OK")]).await;

        let envelope = transport.request(Method::Delete, "/tasks/t1", None).await?;
        assert_eq!(envelope.data, Value::Null);
        Ok(())
    }

    #[tokio::test]
    async fn empty_body_is_null() -> Result<()> {
        let transport = serve(vec![response("204 No Content", None, "")]).await;

        let envelope = transport.request(Method::Delete, "/projects/p1", None).await?;
        assert_eq!(envelope.data, Value::Null);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_json_body_is_an_error() {
        let transport =
            serve(vec![response("200 OK", Some("application/json"), "{not json")]).await;

        let err = transport
            .request(Method::Get, "/tasks", None)
            .await
            .expect_err("malformed body");
        assert!(matches!(err, Error::Json(_)), "{err:?}");
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let transport = serve(vec![response(
            "500 Internal Server Error",
            Some("text/plain"),
            "boom",
        )])
        .await;

        let err = transport
            .request(Method::Put, "/projects/p1", None)
            .await
            .expect_err("server error");
        match &err {
            Error::Api {
                method,
                path,
                status,
                body,
            } => {
                assert_eq!(method, "PUT");
                assert_eq!(path, "/projects/p1");
                assert_eq!(*status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let err = transport_for(&format!("http://{addr}"))
            .request(Method::Get, "/users", None)
            .await
            .expect_err("nothing listening");
        assert!(matches!(err, Error::Transport(_)), "{err:?}");
        assert_eq!(err.exit_code(), crate::error::exit_codes::OPERATION_FAILED);
    }

    #[tokio::test]
    async fn task_delete_acknowledged_as_text_drops_cached_task() {
        let transport = serve(vec![
            response(
                "200 OK",
                Some("application/json"),
                r#"[{"id":"t1","projectId":"p1","name":"Ship","status":"done","assignedTo":null,"endDate":null}]"#,
            ),
            response("200 OK", Some("text/plain; charset=utf-8"), "OK"),
        ])
        .await;
        let store = TaskStore::new(
            ApiClient::new(Arc::new(transport)).tasks(),
            RollbackPolicy::Restore,
        );
        store.fetch_all().await;
        assert!(store.get_by_id("t1").is_some());

        let removed = store.delete("t1").await.expect("delete");

        assert_eq!(removed.map(|task| task.id), Some("t1".to_string()));
        assert!(store.get_by_id("t1").is_none());
        assert!(store.error().is_none());
    }
}
