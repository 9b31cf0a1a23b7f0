//! High-level tool-calling service.
//!
//! `McpToolService` is what the chat layer talks to. It composes the
//! configuration store with one MCP client and never returns an error for an
//! expected failure: every operation yields a structured outcome, and failed
//! tool calls carry a user-facing fallback message.

use chatlink_config::{ConfigStore, ValidationError};
use chatlink_core::{
    FallbackMessages, FunctionSchema, HealthReport, OAuthSetup, OpenAiTool, OperationStatus,
    ProviderSchemas, SchemaProvider, ServerConfig, ToolCallMetadata, ToolCallResult,
    ToolConfigDocument, ToolListing,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::Instrument;
use uuid::Uuid;

use crate::client::McpClient;
use crate::http::{HttpBackend, ReqwestBackend};

/// Error text of every operation attempted while the service is disabled.
pub const NOT_ENABLED: &str = "MCP service is not enabled";

/// Where the service finds its configuration.
#[derive(Debug, Clone)]
pub struct McpServiceOptions {
    /// Directory holding tool-configuration documents
    pub config_dir: PathBuf,
    /// External feature flag
    pub feature_enabled: bool,
    /// Document to use; the first discoverable one when `None`
    pub config_name: Option<String>,
}

impl McpServiceOptions {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            feature_enabled: true,
            config_name: None,
        }
    }

    #[must_use]
    pub const fn with_feature_enabled(mut self, enabled: bool) -> Self {
        self.feature_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_config_name(mut self, name: impl Into<String>) -> Self {
        self.config_name = Some(name.into());
        self
    }
}

/// Diagnostic snapshot returned by [`McpToolService::service_info`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub enabled: bool,
    pub configured_function_count: usize,
    pub server_url: Option<String>,
    /// Request timeout in seconds
    pub timeout: Option<u64>,
    pub auth_configured: bool,
    pub has_access_token: bool,
    pub capabilities: Map<String, Value>,
    pub available_configs: Vec<String>,
    pub config_name: Option<String>,
    pub config_loaded_at: Option<DateTime<Utc>>,
    pub connection_open: bool,
    pub negotiated_protocol_version: Option<String>,
    pub server_name: Option<String>,
}

type BackendFactory<B> = Box<dyn Fn(&ServerConfig) -> B + Send + Sync>;

/// The active document and its client; replaced wholesale on reload.
struct ServiceState<B> {
    config_name: Option<String>,
    document: Option<Arc<ToolConfigDocument>>,
    client: Option<Arc<McpClient<B>>>,
}

impl<B> ServiceState<B> {
    const fn disabled() -> Self {
        Self {
            config_name: None,
            document: None,
            client: None,
        }
    }

    /// The client and document, when the service is enabled.
    fn active(&self) -> Option<(&McpClient<B>, &ToolConfigDocument)> {
        Some((self.client.as_deref()?, self.document.as_deref()?))
    }

    fn fallbacks(&self) -> FallbackMessages {
        self.document
            .as_ref()
            .map(|doc| doc.error_handling.fallback_messages.clone())
            .unwrap_or_default()
    }
}

/// Tool-calling facade over a configuration store and one MCP client.
///
/// Invocations hold a read lock on the active state for their whole
/// duration, so [`McpToolService::reload`] waits for in-flight calls.
pub struct McpToolService<B: HttpBackend = ReqwestBackend> {
    store: ConfigStore,
    requested_config: Option<String>,
    factory: BackendFactory<B>,
    state: RwLock<ServiceState<B>>,
}

impl McpToolService<ReqwestBackend> {
    /// Create a service talking HTTP through reqwest.
    pub fn new(options: McpServiceOptions) -> Self {
        Self::with_backend_factory(options, ReqwestBackend::from_config)
    }
}

impl<B: HttpBackend> McpToolService<B> {
    /// Create a service whose clients use backends built by `factory`.
    pub fn with_backend_factory(
        options: McpServiceOptions,
        factory: impl Fn(&ServerConfig) -> B + Send + Sync + 'static,
    ) -> Self {
        let store =
            ConfigStore::new(options.config_dir).with_feature_enabled(options.feature_enabled);
        let factory: BackendFactory<B> = Box::new(factory);
        let state = build_state(&store, options.config_name.as_deref(), &factory);

        Self {
            store,
            requested_config: options.config_name,
            factory,
            state: RwLock::new(state),
        }
    }

    pub const fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub async fn is_enabled(&self) -> bool {
        self.state.read().await.client.is_some()
    }

    // ------------------------------------------------------------------------
    // Tool invocation
    // ------------------------------------------------------------------------

    /// Validate arguments, call the mapped MCP tool and normalize the outcome.
    ///
    /// Never fails: every error becomes a failed result with a fallback message.
    pub async fn invoke(&self, function: &str, arguments: Map<String, Value>) -> ToolCallResult {
        let correlation_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("mcp_invoke", function, correlation_id = %correlation_id);
        self.invoke_traced(function, &arguments, &correlation_id)
            .instrument(span)
            .await
    }

    async fn invoke_traced(
        &self,
        function: &str,
        arguments: &Map<String, Value>,
        correlation_id: &str,
    ) -> ToolCallResult {
        let state = self.state.read().await;
        let fallbacks = state.fallbacks();
        let mut metadata = ToolCallMetadata {
            function_name: Some(function.to_string()),
            correlation_id: Some(correlation_id.to_string()),
            ..ToolCallMetadata::default()
        };

        let Some((client, _)) = state.active() else {
            tracing::debug!("Tool call rejected, service disabled");
            return failed(NOT_ENABLED, metadata, &fallbacks);
        };
        let config_name = state.config_name.as_deref();

        if let Err(e) = self
            .store
            .validate_arguments(function, arguments, config_name)
        {
            let error = match e {
                ValidationError::UnknownFunction(name) => format!("Unknown function: {name}"),
                other => format!("Parameter validation failed: {other}"),
            };
            tracing::info!(error = %error, "Tool call arguments rejected");
            return failed(error, metadata, &fallbacks);
        }

        let declaration = match self.store.resolve_function(function, config_name) {
            Ok(Some(declaration)) => declaration,
            Ok(None) => return failed(format!("Unknown function: {function}"), metadata, &fallbacks),
            Err(e) => return failed(e.to_string(), metadata, &fallbacks),
        };
        metadata.mcp_tool = Some(declaration.mcp_tool.clone());

        let started = Instant::now();
        let outcome = client.call_tool(&declaration.mcp_tool, arguments).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        metadata.execution_time_ms = Some(elapsed_ms);

        match outcome {
            Ok(mut result) => {
                metadata.sources = std::mem::take(&mut result.metadata.sources);
                metadata.call_id = result.metadata.call_id.take();
                metadata.error_code = result.metadata.error_code;
                let result = result.with_metadata(metadata);

                if result.success {
                    tracing::info!(
                        mcp_tool = %declaration.mcp_tool,
                        elapsed_ms,
                        "Tool call succeeded"
                    );
                    result
                } else {
                    let error = result.error.clone().unwrap_or_default();
                    tracing::warn!(
                        mcp_tool = %declaration.mcp_tool,
                        error = %error,
                        code = ?result.metadata.error_code,
                        "Tool call rejected by server"
                    );
                    let fallback = fallbacks.select(&error).to_string();
                    result.with_fallback(fallback)
                }
            }
            Err(e) => {
                tracing::warn!(
                    mcp_tool = %declaration.mcp_tool,
                    error = %e,
                    elapsed_ms,
                    "Tool call failed"
                );
                failed(e.to_string(), metadata, &fallbacks)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Schema export
    // ------------------------------------------------------------------------

    /// Function schemas for a provider; empty when disabled.
    pub async fn schemas_for(&self, provider: SchemaProvider) -> ProviderSchemas {
        let state = self.state.read().await;
        if state.active().is_none() {
            return ProviderSchemas::empty(provider);
        }

        match self.store.schemas_for(provider, state.config_name.as_deref()) {
            Ok(schemas) => schemas,
            Err(e) => {
                tracing::warn!(provider = %provider, error = %e, "Failed to build function schemas");
                ProviderSchemas::empty(provider)
            }
        }
    }

    /// OpenAI tool-call schemas.
    pub async fn openai_tools(&self) -> Vec<OpenAiTool> {
        match self.schemas_for(SchemaProvider::OpenAi).await {
            ProviderSchemas::OpenAi(tools) => tools,
            _ => Vec::new(),
        }
    }

    /// Prompt section describing the functions, for Anthropic models.
    pub async fn anthropic_prompt(&self) -> String {
        match self.schemas_for(SchemaProvider::Anthropic).await {
            ProviderSchemas::Anthropic(prompt) => prompt,
            _ => String::new(),
        }
    }

    /// Gemini function declarations.
    pub async fn gemini_declarations(&self) -> Vec<FunctionSchema> {
        match self.schemas_for(SchemaProvider::Gemini).await {
            ProviderSchemas::Gemini(declarations) => declarations,
            _ => Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Server pass-through
    // ------------------------------------------------------------------------

    /// One page of the server's tools.
    pub async fn list_available_tools(&self, cursor: Option<&str>) -> ToolListing {
        let state = self.state.read().await;
        match state.active() {
            Some((client, _)) => client.list_tools(cursor).await,
            None => ToolListing::failure(NOT_ENABLED),
        }
    }

    /// Every tool on the server, following pagination.
    pub async fn list_all_tools(&self) -> ToolListing {
        let state = self.state.read().await;
        let Some((client, _)) = state.active() else {
            return ToolListing::failure(NOT_ENABLED);
        };

        match client.list_all_tools().await {
            Ok(tools) => ToolListing::page(tools, None),
            Err(e) => ToolListing::failure(e.to_string()),
        }
    }

    pub async fn initialize_connection(&self) -> OperationStatus {
        let state = self.state.read().await;
        match state.active() {
            Some((client, _)) => client.initialize().await,
            None => OperationStatus::failed(NOT_ENABLED),
        }
    }

    pub async fn health_check(&self) -> HealthReport {
        let state = self.state.read().await;
        match state.active() {
            Some((client, _)) => client.health_check().await,
            None => HealthReport::unhealthy(NOT_ENABLED),
        }
    }

    /// Start the OAuth flow and return the URL to send the user to.
    ///
    /// Without an explicit URL the configured `authorization_endpoint` is used.
    pub async fn setup_oauth(
        &self,
        authorization_url: Option<&str>,
        redirect_uri: &str,
    ) -> OAuthSetup {
        let state = self.state.read().await;
        let Some((client, document)) = state.active() else {
            return OAuthSetup::failed(NOT_ENABLED);
        };

        let configured = document
            .server
            .authorization
            .as_ref()
            .and_then(|auth| auth.authorization_endpoint.as_deref());
        let Some(authorization_url) = authorization_url.or(configured) else {
            return OAuthSetup::failed("No OAuth authorization endpoint configured");
        };

        match client.authenticate_oauth(authorization_url, redirect_uri) {
            Ok(url) => OAuthSetup::ready(url),
            Err(e) => {
                tracing::warn!(error = %e, "OAuth setup failed");
                OAuthSetup::failed(e.to_string())
            }
        }
    }

    /// Exchange the authorization code for an access token.
    ///
    /// Without an explicit URL the configured `token_endpoint` is used.
    pub async fn complete_oauth(
        &self,
        authorization_code: &str,
        redirect_uri: &str,
        token_url: Option<&str>,
    ) -> OperationStatus {
        let state = self.state.read().await;
        let Some((client, document)) = state.active() else {
            return OperationStatus::failed(NOT_ENABLED);
        };

        let configured = document
            .server
            .authorization
            .as_ref()
            .and_then(|auth| auth.token_endpoint.as_deref());
        let Some(token_url) = token_url.or(configured) else {
            return OperationStatus::failed("No OAuth token endpoint configured");
        };

        match client
            .complete_oauth_flow(authorization_code, redirect_uri, token_url)
            .await
        {
            Ok(()) => OperationStatus::ok(),
            Err(e) => {
                tracing::warn!(error = %e, "OAuth token exchange failed");
                OperationStatus::failed(e.to_string())
            }
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Clear the configuration cache and rebuild the client.
    ///
    /// Picks up configuration and connectivity changes without a restart. The
    /// previous client's connection is closed; OAuth tokens are not carried over.
    pub async fn reload(&self) {
        let mut state = self.state.write().await;
        self.store.reload(None);
        let next = build_state(&self.store, self.requested_config.as_deref(), &self.factory);
        let previous = std::mem::replace(&mut *state, next);

        if let Some(client) = previous.client {
            client.close();
        }
        tracing::info!(
            enabled = state.client.is_some(),
            config = ?state.config_name,
            "MCP tool service reloaded"
        );
    }

    /// Close the client's connection; the next call reopens it.
    pub async fn close(&self) {
        if let Some(client) = self.state.read().await.client.as_ref() {
            client.close();
        }
    }

    /// Snapshot of the service configuration and connection state.
    pub async fn service_info(&self) -> ServiceInfo {
        let state = self.state.read().await;
        let document = state.document.as_deref();
        let client = state.client.as_deref();
        let server = document.map(|doc| &doc.server);
        let negotiated = client.and_then(McpClient::negotiated);

        ServiceInfo {
            enabled: client.is_some(),
            configured_function_count: document.map_or(0, |doc| doc.functions.len()),
            server_url: server.map(|s| s.base_url.clone()),
            timeout: server.map(|s| s.timeout),
            auth_configured: server.is_some_and(|s| s.authorization.is_some()),
            has_access_token: client.is_some_and(McpClient::has_access_token),
            capabilities: server.map(|s| s.capabilities.clone()).unwrap_or_default(),
            available_configs: self.store.list_available(),
            config_name: state.config_name.clone(),
            config_loaded_at: state
                .config_name
                .as_deref()
                .and_then(|name| self.store.loaded_at(name)),
            connection_open: client.is_some_and(McpClient::is_open),
            negotiated_protocol_version: negotiated
                .as_ref()
                .and_then(|s| s.protocol_version.clone()),
            server_name: negotiated.and_then(|s| s.server_name),
        }
    }
}

/// Resolve whether the service is enabled and, if so, build its client.
fn build_state<B: HttpBackend>(
    store: &ConfigStore,
    config_name: Option<&str>,
    factory: &BackendFactory<B>,
) -> ServiceState<B> {
    if !store.is_enabled() {
        tracing::warn!(
            directory = %store.directory().display(),
            feature_enabled = store.feature_enabled(),
            "MCP tool service disabled"
        );
        return ServiceState::disabled();
    }

    let loaded = store
        .resolve_name(config_name)
        .and_then(|name| store.load(Some(name.as_str())).map(|doc| (name, doc)));
    match loaded {
        Ok((name, document)) => {
            let client = McpClient::with_backend(factory(&document.server), document.server.clone());
            tracing::info!(
                config = %name,
                server = %document.server.base_url,
                functions = document.functions.len(),
                "MCP tool service enabled"
            );
            ServiceState {
                config_name: Some(name),
                document: Some(document),
                client: Some(Arc::new(client)),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "MCP tool service disabled, configuration failed to load");
            ServiceState::disabled()
        }
    }
}

fn failed(
    error: impl Into<String>,
    metadata: ToolCallMetadata,
    fallbacks: &FallbackMessages,
) -> ToolCallResult {
    let error = error.into();
    let fallback = fallbacks.select(&error).to_string();
    ToolCallResult::failure(error)
        .with_metadata(metadata)
        .with_fallback(fallback)
}
