//! Domain types, independent of transport and storage concerns.

pub mod fallback;
pub mod mcp;
pub mod schema;

pub use fallback::{ErrorHandlingConfig, FallbackCategory, FallbackMessages};
pub use mcp::{
    AuthorizationConfig, ContentType, DEFAULT_PROTOCOL_VERSION, FieldLimit, FunctionDeclaration,
    HealthReport, McpTool, OAuthSetup, OperationStatus, RetryBackoff, ServerConfig,
    ToolCallMetadata, ToolCallResult, ToolConfigDocument, ToolListing, ToolSettings,
    ToolValidationRule, default_capabilities,
};
pub use schema::{
    FunctionSchema, OpenAiFunction, OpenAiTool, ProviderSchemas, SchemaProvider,
    UnknownProviderError, anthropic_prompt,
};
