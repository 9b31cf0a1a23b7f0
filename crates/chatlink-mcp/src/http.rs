//! HTTP backend abstraction for the MCP client.
//!
//! The client talks to the server through the [`HttpBackend`] trait so the
//! transport can be swapped in tests. The production implementation wraps a
//! lazily created reqwest session that can be closed and reopened.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;
use url::Url;

use chatlink_core::ServerConfig;

use crate::error::{McpClientError, McpResult};

/// Content type of every JSON request body.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Response with a JSON body.
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Transport used by [`McpClient`](crate::McpClient).
///
/// Non-success statuses are returned as responses, not errors; only failures
/// to obtain a response (timeout, connection fault) are errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// POST a JSON body.
    async fn post_json(
        &self,
        url: &Url,
        body: &Value,
        headers: Vec<(String, String)>,
    ) -> McpResult<HttpResponse>;

    /// POST a form-encoded body.
    async fn post_form(&self, url: &Url, form: Vec<(String, String)>) -> McpResult<HttpResponse>;

    /// GET a URL.
    async fn get(&self, url: &Url, headers: Vec<(String, String)>) -> McpResult<HttpResponse>;

    /// Close the underlying connection; the next request reopens it.
    fn close(&self);

    /// Whether a connection is currently open.
    fn is_open(&self) -> bool;
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Production backend using reqwest.
///
/// The session is created on first use and every request is bounded by the
/// configured timeout. Expired requests surface as
/// [`McpClientError::Timeout`], other failures as [`McpClientError::Transport`].
pub struct ReqwestBackend {
    timeout: Duration,
    session: Mutex<Option<reqwest::Client>>,
}

impl ReqwestBackend {
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            session: Mutex::new(None),
        }
    }

    /// Backend bounded by the server's configured timeout.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.timeout_duration())
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<reqwest::Client>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the open session, opening one if needed.
    fn session(&self) -> McpResult<reqwest::Client> {
        let mut session = self.lock_session();
        if let Some(client) = session.as_ref() {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("chatlink-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| McpClientError::Transport(format!("failed to create HTTP client: {e}")))?;
        debug!(timeout = ?self.timeout, "Opened MCP HTTP session");
        *session = Some(client.clone());
        Ok(client)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> McpResult<HttpResponse> {
        let response = request.send().await.map_err(|e| self.map_error(&e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(&e))?;
        Ok(HttpResponse { status, body })
    }

    fn map_error(&self, error: &reqwest::Error) -> McpClientError {
        if error.is_timeout() {
            McpClientError::Timeout(self.timeout)
        } else {
            McpClientError::Transport(error.to_string())
        }
    }
}

fn with_headers(
    mut request: reqwest::RequestBuilder,
    headers: Vec<(String, String)>,
) -> reqwest::RequestBuilder {
    for (name, value) in headers {
        request = request.header(name, value);
    }
    request
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn post_json(
        &self,
        url: &Url,
        body: &Value,
        headers: Vec<(String, String)>,
    ) -> McpResult<HttpResponse> {
        let request = self
            .session()?
            .post(url.as_str())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .body(body.to_string());
        self.send(with_headers(request, headers)).await
    }

    async fn post_form(&self, url: &Url, form: Vec<(String, String)>) -> McpResult<HttpResponse> {
        let request = self
            .session()?
            .post(url.as_str())
            .header(ACCEPT, "application/json")
            .form(&form);
        self.send(request).await
    }

    async fn get(&self, url: &Url, headers: Vec<(String, String)>) -> McpResult<HttpResponse> {
        let request = self.session()?.get(url.as_str());
        self.send(with_headers(request, headers)).await
    }

    fn close(&self) {
        if self.lock_session().take().is_some() {
            debug!("Closed MCP HTTP session");
        }
    }

    fn is_open(&self) -> bool {
        self.lock_session().is_some()
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================
