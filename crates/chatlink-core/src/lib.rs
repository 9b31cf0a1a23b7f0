//! Core domain types for chatlink.
//!
//! This crate holds the vocabulary shared by the configuration store, the MCP
//! protocol client and the service layer: server and function declarations,
//! validation rules, structured call outcomes, provider schema views and
//! fallback-message selection. It performs no I/O.
#![deny(unused_crate_dependencies)]

pub mod domain;

// Re-export commonly used types for convenience
pub use domain::{
    AuthorizationConfig, ContentType, DEFAULT_PROTOCOL_VERSION, ErrorHandlingConfig,
    FallbackCategory, FallbackMessages, FieldLimit, FunctionDeclaration, FunctionSchema,
    HealthReport, McpTool, OAuthSetup, OpenAiFunction, OpenAiTool, OperationStatus,
    ProviderSchemas, RetryBackoff, SchemaProvider, ServerConfig, ToolCallMetadata,
    ToolCallResult, ToolConfigDocument, ToolListing, ToolSettings, ToolValidationRule,
    UnknownProviderError, anthropic_prompt, default_capabilities,
};
