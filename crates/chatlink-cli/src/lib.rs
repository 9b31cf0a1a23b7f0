//! Command-line front end for the chatlink MCP tool service.
//!
//! The binary exercises the same [`chatlink_mcp::McpToolService`] the chat
//! backend embeds: list configurations, export provider schemas, invoke
//! functions, page through server tools and run the OAuth flow.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the binary entry point
use dotenvy as _;
use tokio as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use parser::Cli;
