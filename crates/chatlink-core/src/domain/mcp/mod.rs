//! MCP tool-calling domain types.
//!
//! # Design
//!
//! - `ServerConfig` - Connection settings for one MCP server (immutable once a client exists)
//! - `AuthorizationConfig` - Static API key and OAuth client settings
//! - `FunctionDeclaration` - Caller-side description of a tool
//! - `ToolValidationRule` / `FieldLimit` - Declarative argument limits
//! - `ToolConfigDocument` - One parsed configuration document
//! - `ToolCallResult` - Normalized outcome of a tool call
//! - `ToolListing`, `HealthReport`, `OperationStatus`, `OAuthSetup` - Structured outcomes

mod results;
mod types;

pub use results::{
    ContentType, HealthReport, McpTool, OAuthSetup, OperationStatus, ToolCallMetadata,
    ToolCallResult, ToolListing,
};
pub use types::{
    AuthorizationConfig, DEFAULT_PROTOCOL_VERSION, FieldLimit, FunctionDeclaration, RetryBackoff,
    ServerConfig, ToolConfigDocument, ToolSettings, ToolValidationRule, default_capabilities,
};
