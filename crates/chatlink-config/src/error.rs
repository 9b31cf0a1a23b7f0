//! Error types for configuration loading and argument validation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while locating or parsing a configuration document.
///
/// A failure affects only the document being loaded; other cached documents
/// stay valid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A named document does not exist in the configuration directory.
    #[error("Configuration '{name}' not found in {}", .directory.display())]
    NotFound {
        /// Normalized document name
        name: String,
        /// Directory that was searched
        directory: PathBuf,
    },

    /// No name was given and the directory holds no usable documents.
    #[error("No configuration documents found in {}", .directory.display())]
    NoDocuments {
        /// Directory that was searched
        directory: PathBuf,
    },

    /// The document exists but violates the expected structure.
    #[error("Invalid configuration '{name}': {reason}")]
    Invalid {
        /// Normalized document name
        name: String,
        /// Human-readable reason
        reason: String,
    },

    /// The document could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Reasons a set of call arguments is rejected before reaching the network.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field '{field}' has too many items (max {max})")]
    TooManyItems { field: String, max: usize },

    #[error("Field '{field}' is too long (max {max} characters)")]
    TooLong { field: String, max: usize },

    #[error("Field '{field}' must be at least {min}")]
    BelowMinimum { field: String, min: f64 },

    #[error("Field '{field}' must be at most {max}")]
    AboveMaximum { field: String, max: f64 },

    /// The document holding the rules could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_directory() {
        let error = ConfigError::NotFound {
            name: "search.json".to_string(),
            directory: PathBuf::from("/etc/chatlink/mcp"),
        };
        let msg = error.to_string();
        assert!(msg.contains("search.json"));
        assert!(msg.contains("/etc/chatlink/mcp"));
    }

    #[test]
    fn test_missing_field_message() {
        let error = ValidationError::MissingField("query".to_string());
        assert_eq!(error.to_string(), "Missing required field: query");
    }

    #[test]
    fn test_config_error_is_transparent() {
        let error: ValidationError = ConfigError::invalid("a.json", "missing 'tools' section").into();
        assert_eq!(
            error.to_string(),
            "Invalid configuration 'a.json': missing 'tools' section"
        );
    }
}
