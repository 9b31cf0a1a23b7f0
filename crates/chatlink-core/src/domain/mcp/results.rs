//! Structured outcomes returned by the protocol client and the service layer.
//!
//! Expected runtime failures (validation, protocol errors, unhealthy servers)
//! are represented here as values rather than errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the `data` of a successful call was extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// `data` is the `text` field of the first content item.
    Text,
    /// `data` is the raw content (or result) structure.
    Raw,
    /// The response carried neither `result` nor `error`; `data` is the whole body.
    Unknown,
}

/// Metadata attached to a tool call outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,

    /// Source citations collected from content items, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Value>,

    /// Envelope id of the `tools/call` request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,

    /// Protocol error code, when the server rejected the call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_tool: Option<String>,

    /// Id shared by every log line of one service-level invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Normalized, provider-agnostic outcome of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,

    #[serde(default)]
    pub metadata: ToolCallMetadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// User-facing message to display instead of `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_message: Option<String>,
}

impl ToolCallResult {
    /// Create a success result.
    pub fn success(data: Value, content_type: ContentType) -> Self {
        Self {
            success: true,
            data: Some(data),
            content_type: Some(content_type),
            metadata: ToolCallMetadata::default(),
            error: None,
            fallback_message: None,
        }
    }

    /// Create a failure result.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            content_type: None,
            metadata: ToolCallMetadata::default(),
            error: Some(error.into()),
            fallback_message: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: ToolCallMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = Some(message.into());
        self
    }

    /// The payload as text, when the server returned a text content item.
    pub fn text(&self) -> Option<&str> {
        match self.content_type {
            Some(ContentType::Text) => self.data.as_ref().and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Tool definition from `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        default,
        rename = "inputSchema",
        skip_serializing_if = "Option::is_none"
    )]
    pub input_schema: Option<Value>,
}

impl McpTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One page of `tools/list`.
///
/// `next_cursor == None` on a successful page means it was the last one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolListing {
    pub success: bool,
    pub tools: Option<Vec<McpTool>>,
    pub next_cursor: Option<String>,
    pub error: Option<String>,
}

impl ToolListing {
    pub fn page(tools: Vec<McpTool>, next_cursor: Option<String>) -> Self {
        Self {
            success: true,
            tools: Some(tools),
            next_cursor,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            tools: None,
            next_cursor: None,
            error: Some(error.into()),
        }
    }
}

/// Result of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub healthy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub const fn healthy() -> Self {
        Self {
            healthy: true,
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            error: Some(error.into()),
        }
    }
}

/// Success flag plus an error message for operations with no payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationStatus {
    pub const fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Outcome of preparing an OAuth authorization redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthSetup {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OAuthSetup {
    pub fn ready(authorization_url: impl Into<String>) -> Self {
        Self {
            success: true,
            authorization_url: Some(authorization_url.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            authorization_url: None,
            error: Some(error.into()),
        }
    }
}
