//! User-facing fallback messages for failed tool calls.
//!
//! The message is picked by matching the error text against a small set of
//! categories; documents may override any message under
//! `error_handling.fallback_messages`.

use serde::{Deserialize, Serialize};

const DEFAULT_CONNECTION_ERROR: &str =
    "I couldn't reach the tool service right now. Please try again in a moment.";
const DEFAULT_TIMEOUT_ERROR: &str =
    "The tool service took too long to respond. Please try again.";
const DEFAULT_NO_RESULTS: &str = "I couldn't find any matching results.";
const DEFAULT_SERVER_ERROR: &str =
    "The tool service is temporarily unavailable. Please try again later.";
const DEFAULT_GENERIC: &str = "Something went wrong while running the tool. Please try again later.";

fn default_connection_error() -> String {
    DEFAULT_CONNECTION_ERROR.to_string()
}

fn default_timeout_error() -> String {
    DEFAULT_TIMEOUT_ERROR.to_string()
}

fn default_no_results() -> String {
    DEFAULT_NO_RESULTS.to_string()
}

fn default_server_error() -> String {
    DEFAULT_SERVER_ERROR.to_string()
}

fn default_generic() -> String {
    DEFAULT_GENERIC.to_string()
}

/// Category of a failure, derived from its error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackCategory {
    Connection,
    Timeout,
    NoResults,
    ServerError,
    Generic,
}

impl FallbackCategory {
    /// Classify an error message. Matching is case-insensitive and the first
    /// matching category wins.
    pub fn classify(error: &str) -> Self {
        let error = error.to_lowercase();
        if error.contains("connection") {
            Self::Connection
        } else if error.contains("timeout") || error.contains("timed out") {
            Self::Timeout
        } else if error.contains("no results") || error.contains("no result") {
            Self::NoResults
        } else if error.contains("server error") {
            Self::ServerError
        } else {
            Self::Generic
        }
    }
}

/// Configurable fallback messages, one per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackMessages {
    #[serde(default = "default_connection_error")]
    pub connection_error: String,

    #[serde(default = "default_timeout_error")]
    pub timeout_error: String,

    #[serde(default = "default_no_results")]
    pub no_results: String,

    #[serde(default = "default_server_error")]
    pub server_error: String,

    #[serde(default = "default_generic")]
    pub generic: String,
}

impl Default for FallbackMessages {
    fn default() -> Self {
        Self {
            connection_error: default_connection_error(),
            timeout_error: default_timeout_error(),
            no_results: default_no_results(),
            server_error: default_server_error(),
            generic: default_generic(),
        }
    }
}

impl FallbackMessages {
    pub fn message_for(&self, category: FallbackCategory) -> &str {
        match category {
            FallbackCategory::Connection => &self.connection_error,
            FallbackCategory::Timeout => &self.timeout_error,
            FallbackCategory::NoResults => &self.no_results,
            FallbackCategory::ServerError => &self.server_error,
            FallbackCategory::Generic => &self.generic,
        }
    }

    /// Pick the message matching an error text.
    pub fn select(&self, error: &str) -> &str {
        self.message_for(FallbackCategory::classify(error))
    }
}

/// The document's `error_handling` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    #[serde(default)]
    pub fallback_messages: FallbackMessages,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify() {
        assert_eq!(
            FallbackCategory::classify("MCP connection error: connection refused"),
            FallbackCategory::Connection
        );
        assert_eq!(
            FallbackCategory::classify("MCP request timeout after 30s"),
            FallbackCategory::Timeout
        );
        assert_eq!(
            FallbackCategory::classify("Search returned No Results"),
            FallbackCategory::NoResults
        );
        assert_eq!(
            FallbackCategory::classify("MCP server error: HTTP 503"),
            FallbackCategory::ServerError
        );
        assert_eq!(
            FallbackCategory::classify("Invalid params"),
            FallbackCategory::Generic
        );
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config: ErrorHandlingConfig = serde_json::from_value(json!({
            "fallback_messages": {"timeout_error": "Too slow, sorry."}
        }))
        .unwrap();

        let messages = &config.fallback_messages;
        assert_eq!(messages.select("request timed out"), "Too slow, sorry.");
        assert_eq!(messages.connection_error, DEFAULT_CONNECTION_ERROR);
        assert_eq!(messages.select("whatever"), DEFAULT_GENERIC);
    }
}
