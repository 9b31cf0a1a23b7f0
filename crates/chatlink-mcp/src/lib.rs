//! MCP protocol client and tool-calling service.
//!
//! - [`McpClient`] speaks JSON-RPC 2.0 over HTTP to one MCP server: tool
//!   calls with retry, paginated tool discovery, session negotiation, health
//!   checks and the OAuth2 PKCE flow.
//! - [`McpToolService`] composes a [`chatlink_config::ConfigStore`] with one
//!   client and turns every failure into a structured result with a
//!   user-facing fallback message.
#![deny(unused_crate_dependencies)]

pub mod client;
pub mod error;
pub mod http;
pub mod pkce;
pub mod retry;
pub mod service;

pub use client::{McpClient, NegotiatedSession};
pub use error::{McpClientError, McpResult};
pub use http::{HttpBackend, HttpResponse, ReqwestBackend};
pub use retry::RetryPolicy;
pub use service::{McpServiceOptions, McpToolService, NOT_ENABLED, ServiceInfo};
