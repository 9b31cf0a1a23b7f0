//! MCP client for one HTTP server.
//!
//! Requests are JSON-RPC 2.0 style envelopes posted to per-method endpoints
//! under the configured base URL (`/tools/call`, `/tools/list`,
//! `/initialize`). Authentication uses a bearer token: an OAuth access token
//! obtained through the PKCE flow, or the static API key from configuration.

use chatlink_core::{
    ContentType, HealthReport, McpTool, OperationStatus, ServerConfig, ToolCallMetadata,
    ToolCallResult, ToolListing,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{McpClientError, McpResult, excerpt};
use crate::http::{HttpBackend, HttpResponse, ReqwestBackend};
use crate::pkce::{self, CODE_CHALLENGE_METHOD, TokenResponse};
use crate::retry::RetryPolicy;

const CLIENT_NAME: &str = "chatlink";

/// JSON-RPC 2.0 request envelope.
#[derive(Debug)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: String,
    method: &'a str,
    params: Value,
}

impl<'a> JsonRpcRequest<'a> {
    fn new(method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Uuid::new_v4().to_string(),
            method,
            params,
        }
    }

    fn to_value(&self) -> Value {
        json!({
            "jsonrpc": self.jsonrpc,
            "id": self.id,
            "method": self.method,
            "params": self.params,
        })
    }
}

/// `result` of a successful `initialize`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult {
    #[serde(default)]
    protocol_version: Option<String>,
    #[serde(default)]
    server_info: Option<ServerInfo>,
    #[serde(default)]
    capabilities: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerInfo {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

/// What the server agreed to during `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NegotiatedSession {
    pub protocol_version: Option<String>,
    pub server_name: Option<String>,
    pub server_version: Option<String>,
    pub capabilities: Value,
}

/// Credentials mutated by the OAuth flow.
///
/// Both fields sit behind one mutex. Concurrent flows on one client are
/// last-writer-wins: a second `authenticate_oauth` replaces the pending
/// verifier, so exchanging a code issued for the first URL fails.
#[derive(Default)]
struct AuthState {
    access_token: Option<String>,
    code_verifier: Option<String>,
}

/// Client for one MCP server.
pub struct McpClient<B = ReqwestBackend> {
    config: ServerConfig,
    backend: B,
    retry: RetryPolicy,
    auth: Mutex<AuthState>,
    session: Mutex<Option<NegotiatedSession>>,
}

impl McpClient<ReqwestBackend> {
    /// Create a client backed by reqwest.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_backend(ReqwestBackend::from_config(&config), config)
    }
}

impl<B: HttpBackend> McpClient<B> {
    /// Create a client over an explicit backend.
    pub fn with_backend(backend: B, config: ServerConfig) -> Self {
        Self {
            retry: RetryPolicy::from_config(&config),
            config,
            backend,
            auth: Mutex::new(AuthState::default()),
            session: Mutex::new(None),
        }
    }

    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub fn has_access_token(&self) -> bool {
        self.lock_auth().access_token.is_some()
    }

    /// Replace the OAuth access token.
    pub fn set_access_token(&self, token: Option<String>) {
        self.lock_auth().access_token = token;
    }

    /// Result of the last successful `initialize`, if any.
    pub fn negotiated(&self) -> Option<NegotiatedSession> {
        self.lock_session().clone()
    }

    pub fn is_open(&self) -> bool {
        self.backend.is_open()
    }

    /// Close the connection; the next request reopens it.
    pub fn close(&self) {
        self.backend.close();
    }

    /// Authorization header for the current credentials.
    ///
    /// An OAuth access token always wins over a static API key.
    pub fn auth_headers(&self) -> Vec<(String, String)> {
        let auth = self.lock_auth();
        auth.access_token
            .as_deref()
            .or_else(|| self.config.api_key())
            .map(|token| vec![("Authorization".to_string(), format!("Bearer {token}"))])
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------------
    // Tool calls
    // ------------------------------------------------------------------------

    /// Call a tool, retrying server, timeout and transport failures.
    ///
    /// A protocol-level rejection is returned as a failed result, not an error.
    pub async fn call_tool(
        &self,
        tool: &str,
        arguments: &Map<String, Value>,
    ) -> McpResult<ToolCallResult> {
        let url = self.endpoint("tools/call")?;
        let request =
            JsonRpcRequest::new("tools/call", json!({"name": tool, "arguments": arguments}));
        let envelope = request.to_value();
        let started = Instant::now();

        let (url, envelope) = (&url, &envelope);
        let body = self
            .retry
            .run("tools/call", move |attempt| async move {
                debug!(tool, attempt, "Calling MCP tool");
                self.post_envelope(url, envelope).await
            })
            .await?;

        let mut result = parse_tool_response(&body)?;
        result.metadata.execution_time_ms = Some(elapsed_ms(started));
        result.metadata.call_id = Some(request.id);
        debug!(
            tool,
            success = result.success,
            elapsed_ms = result.metadata.execution_time_ms,
            "MCP tool call finished"
        );
        Ok(result)
    }

    // ------------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------------

    /// Fetch one page of `tools/list`. Never fails; errors are in the listing.
    pub async fn list_tools(&self, cursor: Option<&str>) -> ToolListing {
        match self.fetch_tools_page(cursor).await {
            Ok((tools, next_cursor)) => ToolListing::page(tools, next_cursor),
            Err(McpClientError::Protocol { message, .. }) => ToolListing::failure(message),
            Err(e) => ToolListing::failure(e.to_string()),
        }
    }

    /// Follow `nextCursor` from the first page until it is absent.
    ///
    /// A cursor the server already returned is rejected instead of looping.
    pub async fn list_all_tools(&self) -> McpResult<Vec<McpTool>> {
        let mut tools = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor: Option<String> = None;

        loop {
            let (page, next_cursor) = self.fetch_tools_page(cursor.as_deref()).await?;
            tools.extend(page);

            match next_cursor {
                None => break,
                Some(next) if !seen.insert(next.clone()) => {
                    return Err(McpClientError::MalformedResponse(format!(
                        "server repeated pagination cursor '{next}'"
                    )));
                }
                Some(next) => cursor = Some(next),
            }
        }

        debug!(count = tools.len(), pages = seen.len() + 1, "Listed all MCP tools");
        Ok(tools)
    }

    async fn fetch_tools_page(
        &self,
        cursor: Option<&str>,
    ) -> McpResult<(Vec<McpTool>, Option<String>)> {
        let url = self.endpoint("tools/list")?;
        let params = cursor.map_or_else(|| json!({}), |cursor| json!({"cursor": cursor}));
        let envelope = JsonRpcRequest::new("tools/list", params).to_value();

        let body = self.post_envelope(&url, &envelope).await?;
        let result = parse_result(&body)?;

        let tools = match result.get("tools") {
            Some(tools) => serde_json::from_value::<Vec<McpTool>>(tools.clone())
                .map_err(|e| McpClientError::MalformedResponse(format!("invalid tools list: {e}")))?,
            None => Vec::new(),
        };
        let next_cursor = result
            .get("nextCursor")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok((tools, next_cursor))
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Negotiate protocol version and capabilities with the server.
    pub async fn initialize(&self) -> OperationStatus {
        match self.negotiate().await {
            Ok(session) => {
                info!(
                    server = session.server_name.as_deref().unwrap_or("unknown"),
                    protocol_version = session.protocol_version.as_deref().unwrap_or("unknown"),
                    "MCP session initialized"
                );
                *self.lock_session() = Some(session);
                OperationStatus::ok()
            }
            Err(McpClientError::Protocol { message, .. }) => OperationStatus::failed(message),
            Err(e) => {
                warn!(error = %e, "MCP initialize failed");
                OperationStatus::failed(e.to_string())
            }
        }
    }

    async fn negotiate(&self) -> McpResult<NegotiatedSession> {
        let url = self.endpoint("initialize")?;
        let envelope = JsonRpcRequest::new(
            "initialize",
            json!({
                "protocolVersion": self.config.protocol_version,
                "capabilities": self.config.capabilities,
                "clientInfo": {"name": CLIENT_NAME, "version": env!("CARGO_PKG_VERSION")},
            }),
        )
        .to_value();

        let body = self.post_envelope(&url, &envelope).await?;
        let result: InitializeResult = serde_json::from_value(parse_result(&body)?)
            .map_err(|e| McpClientError::MalformedResponse(format!("invalid initialize result: {e}")))?;

        Ok(NegotiatedSession {
            protocol_version: result.protocol_version,
            server_version: result.server_info.as_ref().and_then(|s| s.version.clone()),
            server_name: result.server_info.map(|s| s.name),
            capabilities: result.capabilities.unwrap_or_else(|| json!({})),
        })
    }

    /// `GET {base_url}/health`; only HTTP 200 counts as healthy.
    pub async fn health_check(&self) -> HealthReport {
        let url = match self.endpoint("health") {
            Ok(url) => url,
            Err(e) => return HealthReport::unhealthy(e.to_string()),
        };

        match self.backend.get(&url, self.auth_headers()).await {
            Ok(response) if response.status == 200 => HealthReport::healthy(),
            Ok(response) => {
                HealthReport::unhealthy(format!("Health check failed: HTTP {}", response.status))
            }
            Err(e) => HealthReport::unhealthy(e.to_string()),
        }
    }

    // ------------------------------------------------------------------------
    // OAuth2 PKCE
    // ------------------------------------------------------------------------

    /// Start an authorization-code flow and return the URL to send the user to.
    ///
    /// Requires `authorization.client_id`. Stores a fresh code verifier,
    /// replacing any pending one.
    pub fn authenticate_oauth(
        &self,
        authorization_url: &str,
        redirect_uri: &str,
    ) -> McpResult<String> {
        let authorization = self.config.authorization.as_ref();
        let client_id = authorization
            .and_then(|auth| auth.client_id())
            .ok_or_else(|| McpClientError::Auth("OAuth client_id is not configured".to_string()))?;

        let mut url = Url::parse(authorization_url)?;
        let verifier = pkce::generate_code_verifier();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", client_id)
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("code_challenge", &pkce::code_challenge(&verifier))
                .append_pair("code_challenge_method", CODE_CHALLENGE_METHOD);
            if let Some(scope) = authorization.and_then(|auth| auth.scope()) {
                query.append_pair("scope", scope);
            }
        }

        self.lock_auth().code_verifier = Some(verifier);
        info!(endpoint = %authorization_url, "Prepared OAuth authorization request");
        Ok(url.into())
    }

    /// Exchange an authorization code for an access token.
    ///
    /// On success the token is used for every later request.
    pub async fn complete_oauth_flow(
        &self,
        authorization_code: &str,
        redirect_uri: &str,
        token_url: &str,
    ) -> McpResult<()> {
        let verifier = self
            .lock_auth()
            .code_verifier
            .clone()
            .ok_or_else(|| McpClientError::Auth("OAuth flow not initialized".to_string()))?;
        let client_id = self
            .config
            .authorization
            .as_ref()
            .and_then(|auth| auth.client_id())
            .ok_or_else(|| McpClientError::Auth("OAuth client_id is not configured".to_string()))?;

        let url = Url::parse(token_url)?;
        let form = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("client_id".to_string(), client_id.to_string()),
            ("code".to_string(), authorization_code.to_string()),
            ("redirect_uri".to_string(), redirect_uri.to_string()),
            ("code_verifier".to_string(), verifier.clone()),
        ];

        let response = self.backend.post_form(&url, form).await?;
        if !response.is_success() {
            return Err(McpClientError::Auth(format!(
                "Token exchange failed: HTTP {}: {}",
                response.status,
                excerpt(&response.body)
            )));
        }

        let token: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|e| McpClientError::Auth(format!("Invalid token response: {e}")))?;
        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| McpClientError::Auth("No access token in response".to_string()))?;

        {
            let mut auth = self.lock_auth();
            auth.access_token = Some(access_token);
            if auth.code_verifier.as_deref() == Some(verifier.as_str()) {
                auth.code_verifier = None;
            }
        }

        info!(
            token_type = token.token_type.as_deref().unwrap_or("Bearer"),
            expires_in = token.expires_in,
            "Obtained OAuth access token"
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// `{base_url}/{path}`, tolerating a trailing slash on the base.
    fn endpoint(&self, path: &str) -> McpResult<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// POST an envelope and return the body of a 2xx response.
    async fn post_envelope(&self, url: &Url, envelope: &Value) -> McpResult<String> {
        let response: HttpResponse = self
            .backend
            .post_json(url, envelope, self.auth_headers())
            .await?;

        if response.is_success() {
            Ok(response.body)
        } else {
            Err(McpClientError::from_status(response.status, &response.body))
        }
    }

    fn lock_auth(&self) -> MutexGuard<'_, AuthState> {
        self.auth.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<NegotiatedSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn parse_json(body: &str) -> McpResult<Value> {
    serde_json::from_str(body).map_err(|e| McpClientError::MalformedResponse(e.to_string()))
}

/// Protocol error carried by a response, if any.
fn protocol_error(value: &Value) -> Option<McpClientError> {
    let error = value.get("error").filter(|e| !e.is_null())?;
    Some(McpClientError::Protocol {
        code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
        message: error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown MCP error")
            .to_string(),
    })
}

/// The `result` of a response, or its protocol error.
fn parse_result(body: &str) -> McpResult<Value> {
    let mut value = parse_json(body)?;
    if let Some(error) = protocol_error(&value) {
        return Err(error);
    }
    value
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| McpClientError::MalformedResponse("response has no result".to_string()))
}

/// Normalize a `tools/call` response body.
///
/// Only a body that is not JSON is an error; a protocol rejection becomes a
/// failed result carrying the server's message and code.
pub(crate) fn parse_tool_response(body: &str) -> McpResult<ToolCallResult> {
    let value = parse_json(body)?;

    if let Some(McpClientError::Protocol { code, message }) = protocol_error(&value) {
        let mut result = ToolCallResult::failure(message);
        result.metadata.error_code = Some(code);
        return Ok(result);
    }

    let Some(result) = value.get("result") else {
        return Ok(ToolCallResult::success(value, ContentType::Unknown));
    };

    let Some(content) = result.get("content") else {
        return Ok(ToolCallResult::success(result.clone(), ContentType::Raw));
    };

    let items = content.as_array().map(Vec::as_slice).unwrap_or_default();
    let metadata = ToolCallMetadata {
        sources: collect_sources(items),
        ..ToolCallMetadata::default()
    };

    let text = items
        .first()
        .and_then(|item| item.get("text"))
        .filter(|text| !text.is_null());
    let outcome = match text {
        Some(text) => ToolCallResult::success(text.clone(), ContentType::Text),
        None => ToolCallResult::success(content.clone(), ContentType::Raw),
    };
    Ok(outcome.with_metadata(metadata))
}

/// Source objects from content items, in order.
fn collect_sources(items: &[Value]) -> Vec<Value> {
    items
        .iter()
        .filter_map(|item| {
            item.get("source")
                .or_else(|| item.get("metadata").and_then(|m| m.get("source")))
        })
        .filter(|source| !source.is_null())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockHttpBackend;
    use crate::http::testing::{FakeBackend, RecordedRequest};
    use chatlink_core::AuthorizationConfig;
    use std::time::Duration;

    fn config() -> ServerConfig {
        ServerConfig::new("http://mcp.local:8000/").with_retry(3, 0.0)
    }

    fn oauth_config() -> ServerConfig {
        config().with_authorization(AuthorizationConfig {
            auth_type: Some("oauth2".to_string()),
            client_id: Some("chatlink-test".to_string()),
            scope: Some("tools:read tools:call".to_string()),
            api_key: Some("static-key".to_string()),
            ..Default::default()
        })
    }

    fn client(backend: &FakeBackend, config: ServerConfig) -> McpClient<FakeBackend> {
        McpClient::with_backend(backend.clone(), config)
    }

    fn arguments(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn query_pairs(url: &str) -> Vec<(String, String)> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn query_value(pairs: &[(String, String)], key: &str) -> Option<String> {
        pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    // -- response parsing ----------------------------------------------------

    #[test]
    fn test_parse_text_content() {
        let result = parse_tool_response(
            r#"{"result":{"content":[{"type":"text","text":"found 3 items"}]}}"#,
        )
        .unwrap();
        assert!(result.success);
        assert_eq!(result.text(), Some("found 3 items"));
        assert_eq!(result.content_type, Some(ContentType::Text));
    }

    #[test]
    fn test_parse_raw_content_without_text() {
        let result = parse_tool_response(
            r#"{"result":{"content":[{"type":"image","data":"aGk=","mimeType":"image/png"}]}}"#,
        )
        .unwrap();
        assert_eq!(result.content_type, Some(ContentType::Raw));
        assert_eq!(result.data.unwrap()[0]["type"], "image");
    }

    #[test]
    fn test_parse_result_without_content() {
        let result = parse_tool_response(r#"{"result":{"rows":[1,2]}}"#).unwrap();
        assert_eq!(result.content_type, Some(ContentType::Raw));
        assert_eq!(result.data, Some(json!({"rows": [1, 2]})));
    }

    #[test]
    fn test_parse_unknown_shape() {
        let result = parse_tool_response(r#"{"status":"done"}"#).unwrap();
        assert!(result.success);
        assert_eq!(result.content_type, Some(ContentType::Unknown));
        assert_eq!(result.data, Some(json!({"status": "done"})));
    }

    #[test]
    fn test_parse_protocol_error() {
        let result =
            parse_tool_response(r#"{"error":{"code":-32602,"message":"Unknown tool: nope"}}"#)
                .unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unknown tool: nope"));
        assert_eq!(result.metadata.error_code, Some(-32602));
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(matches!(
            parse_tool_response("<html>oops</html>"),
            Err(McpClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_sources_collected_in_order() {
        let result = parse_tool_response(
            &json!({"result": {"content": [
                {"type": "text", "text": "a", "source": {"url": "https://a"}},
                {"type": "text", "text": "b"},
                {"type": "text", "text": "c", "metadata": {"source": {"url": "https://c"}}}
            ]}})
            .to_string(),
        )
        .unwrap();

        assert_eq!(
            result.metadata.sources,
            vec![json!({"url": "https://a"}), json!({"url": "https://c"})]
        );
        assert_eq!(result.text(), Some("a"));
    }

    // -- tool calls ----------------------------------------------------------

    #[tokio::test]
    async fn test_call_tool_envelope() {
        let backend = FakeBackend::json(
            200,
            json!({"result": {"content": [{"type": "text", "text": "ok"}]}}),
        );
        let client = client(&backend, config());

        let result = client
            .call_tool("search_tool", &arguments(json!({"query": "x"})))
            .await
            .unwrap();

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.as_str(), "http://mcp.local:8000/tools/call");

        let body = requests[0].body.as_ref().unwrap();
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["method"], "tools/call");
        assert_eq!(body["params"]["name"], "search_tool");
        assert_eq!(body["params"]["arguments"]["query"], "x");
        assert_eq!(result.metadata.call_id.as_deref(), body["id"].as_str());
        assert!(result.metadata.execution_time_ms.is_some());
    }

    #[tokio::test]
    async fn test_server_error_retried_exactly_three_times() {
        let mut backend = MockHttpBackend::new();
        backend
            .expect_post_json()
            .times(3)
            .returning(|_, _, _| Ok(HttpResponse::new(500, "internal error")));

        let client = McpClient::with_backend(backend, config());
        let result = client.call_tool("search_tool", &Map::new()).await;

        assert!(matches!(result, Err(McpClientError::Server { status: 500 })));
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let mut backend = MockHttpBackend::new();
        backend
            .expect_post_json()
            .times(1)
            .returning(|_, _, _| Ok(HttpResponse::new(404, "no such endpoint")));

        let client = McpClient::with_backend(backend, config());
        let result = client.call_tool("search_tool", &Map::new()).await;

        assert!(matches!(result, Err(McpClientError::Client { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_protocol_error_not_retried() {
        let backend = FakeBackend::json(
            200,
            json!({"error": {"code": -32601, "message": "Tool not found"}}),
        );
        let client = client(&backend, config());

        let result = client.call_tool("missing_tool", &Map::new()).await.unwrap();

        assert!(!result.success);
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_retried_then_recovers() {
        let backend = FakeBackend::new({
            let calls = std::sync::atomic::AtomicUsize::new(0);
            move |_| {
                if calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                    Err(McpClientError::Timeout(Duration::from_secs(30)))
                } else {
                    Ok(HttpResponse::json(
                        200,
                        &json!({"result": {"content": [{"type": "text", "text": "late"}]}}),
                    ))
                }
            }
        });
        let client = client(&backend, config());

        let result = client.call_tool("search_tool", &Map::new()).await.unwrap();
        assert_eq!(result.text(), Some("late"));
        assert_eq!(backend.request_count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_body_not_retried() {
        let backend = FakeBackend::new(|_| Ok(HttpResponse::new(200, "not json")));
        let client = client(&backend, config());

        let result = client.call_tool("search_tool", &Map::new()).await;
        assert!(matches!(result, Err(McpClientError::MalformedResponse(_))));
        assert_eq!(backend.request_count(), 1);
    }

    // -- auth headers --------------------------------------------------------

    #[test]
    fn test_auth_header_precedence() {
        let backend = FakeBackend::json(200, json!({}));

        let anonymous = client(&backend, config());
        assert!(anonymous.auth_headers().is_empty());

        let keyed = client(&backend, oauth_config());
        assert_eq!(
            keyed.auth_headers(),
            vec![("Authorization".to_string(), "Bearer static-key".to_string())]
        );

        keyed.set_access_token(Some("oauth-token".to_string()));
        assert_eq!(
            keyed.auth_headers(),
            vec![("Authorization".to_string(), "Bearer oauth-token".to_string())]
        );
    }

    #[tokio::test]
    async fn test_requests_carry_auth_header() {
        let backend = FakeBackend::json(200, json!({"result": {"tools": []}}));
        let client = client(&backend, oauth_config());
        client.list_tools(None).await;

        assert_eq!(
            backend.requests()[0].header("Authorization"),
            Some("Bearer static-key")
        );
    }

    // -- pagination ----------------------------------------------------------

    /// Server that serves `total` tools in pages of `page_size`.
    fn paginated_backend(total: usize, page_size: usize) -> FakeBackend {
        FakeBackend::new(move |request: &RecordedRequest| {
            let params = &request.body.as_ref().unwrap()["params"];
            let start = params
                .get("cursor")
                .and_then(Value::as_str)
                .map_or(0, |c| c.parse::<usize>().unwrap());
            let end = (start + page_size).min(total);
            let tools: Vec<Value> = (start..end)
                .map(|i| json!({"name": format!("tool_{i}")}))
                .collect();

            let mut result = json!({"tools": tools});
            if end < total {
                result["nextCursor"] = json!(end.to_string());
            }
            Ok(HttpResponse::json(200, &json!({"result": result})))
        })
    }

    #[tokio::test]
    async fn test_pagination_visits_every_tool_once() {
        for page_size in [1, 2, 10_000] {
            let total = 25;
            let backend = paginated_backend(total, page_size);
            let client = client(&backend, config());

            let tools = client.list_all_tools().await.unwrap();
            let names: HashSet<_> = tools.iter().map(|t| t.name.clone()).collect();

            assert_eq!(tools.len(), total, "page size {page_size}");
            assert_eq!(names.len(), total, "page size {page_size}");
            assert_eq!(backend.request_count(), total.div_ceil(page_size));
        }
    }

    #[tokio::test]
    async fn test_manual_pagination_by_cursor() {
        let backend = paginated_backend(3, 2);
        let client = client(&backend, config());

        let first = client.list_tools(None).await;
        assert!(first.success);
        assert_eq!(first.tools.as_ref().unwrap().len(), 2);
        assert_eq!(first.next_cursor.as_deref(), Some("2"));

        let second = client.list_tools(first.next_cursor.as_deref()).await;
        assert_eq!(second.tools.unwrap()[0].name, "tool_2");
        assert!(second.next_cursor.is_none());

        let body = backend.requests()[1].body.clone().unwrap();
        assert_eq!(body["params"]["cursor"], "2");
    }

    #[tokio::test]
    async fn test_repeated_cursor_is_rejected() {
        let backend = FakeBackend::json(
            200,
            json!({"result": {"tools": [{"name": "a"}], "nextCursor": "same"}}),
        );
        let client = client(&backend, config());

        assert!(matches!(
            client.list_all_tools().await,
            Err(McpClientError::MalformedResponse(_))
        ));
        assert_eq!(backend.request_count(), 2);
    }

    #[tokio::test]
    async fn test_list_tools_surfaces_protocol_message() {
        let backend =
            FakeBackend::json(200, json!({"error": {"code": -32000, "message": "listing disabled"}}));
        let client = client(&backend, config());

        let listing = client.list_tools(None).await;
        assert!(!listing.success);
        assert_eq!(listing.error.as_deref(), Some("listing disabled"));
    }

    // -- lifecycle -----------------------------------------------------------

    #[tokio::test]
    async fn test_initialize_stores_negotiated_session() {
        let backend = FakeBackend::json(
            200,
            json!({"result": {
                "protocolVersion": "2025-06-18",
                "capabilities": {"tools": {"listChanged": false}},
                "serverInfo": {"name": "search-server", "version": "1.2.0"}
            }}),
        );
        let client = client(&backend, config());

        assert!(client.initialize().await.success);

        let body = backend.requests()[0].body.clone().unwrap();
        assert_eq!(body["method"], "initialize");
        assert_eq!(body["params"]["protocolVersion"], "2025-06-18");
        assert!(body["params"]["capabilities"]["roots"].is_object());
        assert_eq!(body["params"]["clientInfo"]["name"], "chatlink");

        let session = client.negotiated().unwrap();
        assert_eq!(session.server_name.as_deref(), Some("search-server"));
        assert_eq!(session.server_version.as_deref(), Some("1.2.0"));
    }

    #[tokio::test]
    async fn test_initialize_failures_are_values() {
        let backend = FakeBackend::new(|_| Ok(HttpResponse::new(503, "")));
        let status = client(&backend, config()).initialize().await;
        assert!(!status.success);
        assert!(status.error.unwrap().contains("503"));

        let backend = FakeBackend::new(|_| Ok(HttpResponse::new(200, "{")));
        let client = client(&backend, config());
        assert!(!client.initialize().await.success);
        assert!(client.negotiated().is_none());
    }

    #[tokio::test]
    async fn test_health_check() {
        let backend = FakeBackend::new(|_| Ok(HttpResponse::new(200, "ok")));
        let report = client(&backend, config()).health_check().await;
        assert!(report.healthy);
        assert_eq!(backend.requests()[0].method, "GET");
        assert_eq!(backend.requests()[0].path(), "/health");

        let backend = FakeBackend::new(|_| Ok(HttpResponse::new(204, "")));
        assert!(!client(&backend, config()).health_check().await.healthy);

        let backend =
            FakeBackend::new(|_| Err(McpClientError::Transport("connection refused".to_string())));
        let report = client(&backend, config()).health_check().await;
        assert!(!report.healthy);
        assert!(report.error.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_close_and_reopen() {
        let backend = FakeBackend::json(200, json!({"result": {"tools": []}}));
        let client = client(&backend, config());
        assert!(!client.is_open());

        client.list_tools(None).await;
        assert!(client.is_open());

        client.close();
        assert!(!client.is_open());

        client.list_tools(None).await;
        assert!(client.is_open());
    }

    // -- OAuth ---------------------------------------------------------------

    #[test]
    fn test_authorization_url_parameters() {
        let backend = FakeBackend::json(200, json!({}));
        let client = client(&backend, oauth_config());

        let url = client
            .authenticate_oauth("https://auth.local/authorize", "http://localhost/callback")
            .unwrap();
        let pairs = query_pairs(&url);

        assert!(url.starts_with("https://auth.local/authorize?"));
        assert_eq!(query_value(&pairs, "response_type").as_deref(), Some("code"));
        assert_eq!(query_value(&pairs, "client_id").as_deref(), Some("chatlink-test"));
        assert_eq!(
            query_value(&pairs, "redirect_uri").as_deref(),
            Some("http://localhost/callback")
        );
        assert_eq!(query_value(&pairs, "code_challenge_method").as_deref(), Some("S256"));
        assert_eq!(
            query_value(&pairs, "scope").as_deref(),
            Some("tools:read tools:call")
        );

        let verifier = client.lock_auth().code_verifier.clone().unwrap();
        assert_eq!(
            query_value(&pairs, "code_challenge").unwrap(),
            pkce::code_challenge(&verifier)
        );
    }

    #[test]
    fn test_oauth_requires_client_id() {
        let backend = FakeBackend::json(200, json!({}));
        let client = client(&backend, config());

        let result = client.authenticate_oauth("https://auth.local/authorize", "http://cb");
        assert!(matches!(result, Err(McpClientError::Auth(_))));
    }

    #[tokio::test]
    async fn test_complete_without_authenticate_fails() {
        let backend = FakeBackend::json(200, json!({"access_token": "t"}));
        let client = client(&backend, oauth_config());

        let err = client
            .complete_oauth_flow("code", "http://cb", "https://auth.local/token")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("OAuth flow not initialized"));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_complete_oauth_flow_stores_token() {
        let backend = FakeBackend::json(
            200,
            json!({"access_token": "oauth-token", "token_type": "Bearer", "expires_in": 3600}),
        );
        let client = client(&backend, oauth_config());
        client
            .authenticate_oauth("https://auth.local/authorize", "http://cb")
            .unwrap();
        let verifier = client.lock_auth().code_verifier.clone().unwrap();

        client
            .complete_oauth_flow("auth-code", "http://cb", "https://auth.local/token")
            .await
            .unwrap();

        let request = &backend.requests()[0];
        assert_eq!(request.form_value("grant_type"), Some("authorization_code"));
        assert_eq!(request.form_value("client_id"), Some("chatlink-test"));
        assert_eq!(request.form_value("code"), Some("auth-code"));
        assert_eq!(request.form_value("redirect_uri"), Some("http://cb"));
        assert_eq!(request.form_value("code_verifier"), Some(verifier.as_str()));

        assert!(client.has_access_token());
        assert!(client.lock_auth().code_verifier.is_none());
        assert_eq!(
            client.auth_headers()[0].1,
            "Bearer oauth-token".to_string()
        );
    }

    #[tokio::test]
    async fn test_token_endpoint_failures() {
        let cases = [
            (HttpResponse::new(400, r#"{"error":"invalid_grant"}"#), "invalid_grant"),
            (HttpResponse::new(200, r#"{"token_type":"Bearer"}"#), "No access token in response"),
            (HttpResponse::new(200, "<html>"), "Invalid token response"),
        ];

        for (response, expected) in cases {
            let backend = FakeBackend::new(move |_| Ok(response.clone()));
            let client = client(&backend, oauth_config());
            client
                .authenticate_oauth("https://auth.local/authorize", "http://cb")
                .unwrap();

            let err = client
                .complete_oauth_flow("code", "http://cb", "https://auth.local/token")
                .await
                .unwrap_err();
            assert!(err.to_string().contains(expected), "{err}");
            assert!(!client.has_access_token());
        }
    }

    /// Concurrent flows are last-writer-wins: only the most recent
    /// authorization URL's verifier is exchanged.
    #[tokio::test]
    async fn test_concurrent_oauth_attempts_last_writer_wins() {
        let backend = FakeBackend::json(200, json!({"access_token": "t"}));
        let client = client(&backend, oauth_config());

        let first = client
            .authenticate_oauth("https://auth.local/authorize", "http://cb")
            .unwrap();
        let second = client
            .authenticate_oauth("https://auth.local/authorize", "http://cb")
            .unwrap();

        client
            .complete_oauth_flow("code", "http://cb", "https://auth.local/token")
            .await
            .unwrap();

        let sent = backend.requests()[0]
            .form_value("code_verifier")
            .unwrap()
            .to_string();
        let sent_challenge = pkce::code_challenge(&sent);
        assert_eq!(
            query_value(&query_pairs(&second), "code_challenge"),
            Some(sent_challenge.clone())
        );
        assert_ne!(
            query_value(&query_pairs(&first), "code_challenge"),
            Some(sent_challenge)
        );
    }
}
