//! Error types for MCP protocol operations.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for MCP client operations.
pub type McpResult<T> = Result<T, McpClientError>;

/// Longest response-body excerpt carried inside an error.
const BODY_EXCERPT_CHARS: usize = 200;

/// Errors raised by the MCP client.
///
/// Only server, timeout and transport failures are retried; see
/// [`McpClientError::is_retryable`].
#[derive(Debug, Clone, Error)]
pub enum McpClientError {
    /// HTTP 4xx (or any other non-success status below 500).
    #[error("MCP client error: HTTP {status}: {body}")]
    Client {
        /// HTTP status code
        status: u16,
        /// Excerpt of the response body
        body: String,
    },

    /// HTTP 5xx.
    #[error("MCP server error: HTTP {status}")]
    Server {
        /// HTTP status code
        status: u16,
    },

    /// The request did not complete within the configured timeout.
    #[error("MCP request timeout after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure (DNS, refused, reset).
    #[error("MCP connection error: {0}")]
    Transport(String),

    /// A well-formed response carrying a top-level `error` object.
    #[error("MCP protocol error {code}: {message}")]
    Protocol {
        /// Protocol error code
        code: i64,
        /// Server-provided message
        message: String,
    },

    /// The response body could not be interpreted.
    #[error("Malformed MCP response: {0}")]
    MalformedResponse(String),

    /// OAuth setup or token exchange failure.
    #[error("MCP authentication error: {0}")]
    Auth(String),

    /// A configured or supplied URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl McpClientError {
    /// Whether another attempt may succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Server { .. } | Self::Timeout(_) | Self::Transport(_)
        )
    }

    /// Map a non-success HTTP status to an error.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        if status >= 500 {
            Self::Server { status }
        } else {
            Self::Client {
                status,
                body: excerpt(body),
            }
        }
    }
}

/// First characters of a response body, for error messages.
pub(crate) fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(BODY_EXCERPT_CHARS).collect();
    cut.push_str("...");
    cut
}
