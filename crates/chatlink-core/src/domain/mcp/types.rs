//! Tool-configuration domain types.
//!
//! These mirror the JSON configuration documents one-to-one so they can be
//! deserialized directly with serde.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use crate::domain::fallback::ErrorHandlingConfig;

/// MCP protocol version announced during `initialize` unless overridden.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-06-18";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_SECS: f64 = 1.0;

const fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

const fn default_retry_delay() -> f64 {
    DEFAULT_RETRY_DELAY_SECS
}

fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}

const fn default_enabled() -> bool {
    true
}

fn default_parameters() -> Value {
    json!({"type": "object", "properties": {}})
}

/// Capabilities the client declares when none are configured.
pub fn default_capabilities() -> Map<String, Value> {
    let mut capabilities = Map::new();
    capabilities.insert("roots".to_string(), json!({"listChanged": true}));
    capabilities.insert("sampling".to_string(), json!({}));
    capabilities.insert("elicitation".to_string(), json!({}));
    capabilities
}

/// Delay growth between retry attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryBackoff {
    /// Delay doubles after every failed attempt.
    #[default]
    Exponential,
    /// Same delay before every retry.
    Fixed,
}

/// Authorization settings for an MCP server.
///
/// Either a static `api_key` or OAuth client settings (or both). Secrets are
/// redacted from the `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Free-form auth scheme name (e.g. "oauth2", "api_key").
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Static bearer credential, used until an OAuth access token is obtained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Space-separated OAuth scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

impl AuthorizationConfig {
    /// Static API key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        non_empty(self.api_key.as_ref())
    }

    /// OAuth client ID, ignoring blank values.
    pub fn client_id(&self) -> Option<&str> {
        non_empty(self.client_id.as_ref())
    }

    /// OAuth scope, ignoring blank values.
    pub fn scope(&self) -> Option<&str> {
        non_empty(self.scope.as_ref())
    }
}

impl fmt::Debug for AuthorizationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("AuthorizationConfig")
            .field("auth_type", &self.auth_type)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("api_key", &redact(&self.api_key))
            .field("scope", &self.scope)
            .field("authorization_endpoint", &self.authorization_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .finish()
    }
}

/// Connection settings for one MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL; endpoints such as `/tools/call` are appended to it.
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Total attempts for a tool call, including the first one.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base delay between attempts, in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: f64,

    #[serde(default)]
    pub retry_backoff: RetryBackoff,

    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<AuthorizationConfig>,

    /// Capabilities declared to the server during `initialize`.
    #[serde(default = "default_capabilities")]
    pub capabilities: Map<String, Value>,
}

impl ServerConfig {
    /// Create a configuration with default timeouts and retries.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT_SECS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY_SECS,
            retry_backoff: RetryBackoff::default(),
            protocol_version: default_protocol_version(),
            authorization: None,
            capabilities: default_capabilities(),
        }
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the retry attempts and base delay (seconds).
    #[must_use]
    pub const fn with_retry(mut self, attempts: u32, delay_secs: f64) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay_secs;
        self
    }

    /// Set the retry backoff strategy.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: RetryBackoff) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set the authorization settings.
    #[must_use]
    pub fn with_authorization(mut self, authorization: AuthorizationConfig) -> Self {
        self.authorization = Some(authorization);
        self
    }

    /// Request timeout as a `Duration`.
    pub const fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Base retry delay as a `Duration`. Negative or non-finite values count as zero.
    pub fn retry_delay_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_delay).unwrap_or(Duration::ZERO)
    }

    /// Static API key, if configured.
    pub fn api_key(&self) -> Option<&str> {
        self.authorization
            .as_ref()
            .and_then(AuthorizationConfig::api_key)
    }
}

/// Caller-side description of a tool exposed by the MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Function name presented to the model; unique within a document.
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tool name on the server; may differ from `name`.
    pub mcp_tool: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// JSON-schema-like parameter description.
    #[serde(default = "default_parameters")]
    pub parameters: Value,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usage_examples: Vec<Value>,
}

impl FunctionDeclaration {
    /// Create an enabled declaration with an empty parameter object.
    pub fn new(name: impl Into<String>, mcp_tool: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            mcp_tool: mcp_tool.into(),
            enabled: true,
            parameters: default_parameters(),
            usage_examples: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Limits applied to a single argument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldLimit {
    /// Maximum string length, in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Maximum number of elements in an array argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

/// Declarative argument rules for one function.
///
/// `field_limits` is ordered so validation reports violations deterministically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolValidationRule {
    #[serde(default)]
    pub required_fields: Vec<String>,

    #[serde(default)]
    pub field_limits: BTreeMap<String, FieldLimit>,
}

/// Per-function settings under the document's `tools` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ToolValidationRule>,
}

/// One parsed tool-configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfigDocument {
    #[serde(rename = "mcp_server", alias = "server")]
    pub server: ServerConfig,

    pub functions: Vec<FunctionDeclaration>,

    #[serde(default)]
    pub tools: HashMap<String, ToolSettings>,

    #[serde(default)]
    pub error_handling: ErrorHandlingConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_search_params: Option<Value>,
}

impl ToolConfigDocument {
    /// Look up a declaration by function name (enabled or not).
    pub fn function(&self, name: &str) -> Option<&FunctionDeclaration> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Declarations with `enabled == true`, in document order.
    pub fn enabled_functions(&self) -> impl Iterator<Item = &FunctionDeclaration> {
        self.functions.iter().filter(|f| f.enabled)
    }

    /// Validation rule for a function, if one is declared.
    pub fn validation_rule(&self, name: &str) -> Option<&ToolValidationRule> {
        self.tools.get(name).and_then(|t| t.validation.as_ref())
    }
}
