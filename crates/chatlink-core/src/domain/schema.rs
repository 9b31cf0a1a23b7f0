//! Provider-specific function-calling views of `FunctionDeclaration`.
//!
//! Three shapes are supported:
//! - `OpenAi` - tool-call schema, `{type: "function", function: {...}}` per function
//! - `Anthropic` - a single prompt section describing every function
//! - `Gemini` - flat `{name, description, parameters}` declarations
//!
//! Disabled functions never appear in any view.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::mcp::FunctionDeclaration;

/// LLM vendor whose function-calling format is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaProvider {
    OpenAi,
    Anthropic,
    Gemini,
}

/// Error returned when parsing an unrecognized provider name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown schema provider '{0}' (expected openai, anthropic or gemini)")]
pub struct UnknownProviderError(pub String);

impl FromStr for SchemaProvider {
    type Err = UnknownProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(UnknownProviderError(other.to_string())),
        }
    }
}

impl fmt::Display for SchemaProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
        };
        f.write_str(name)
    }
}

/// Flat function declaration (Gemini shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl From<&FunctionDeclaration> for FunctionSchema {
    fn from(declaration: &FunctionDeclaration) -> Self {
        Self {
            name: declaration.name.clone(),
            description: declaration.description.clone(),
            parameters: declaration.parameters.clone(),
        }
    }
}

/// Function body of an OpenAI tool entry.
pub type OpenAiFunction = FunctionSchema;

/// OpenAI tool-call schema entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiTool {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: OpenAiFunction,
}

impl From<&FunctionDeclaration> for OpenAiTool {
    fn from(declaration: &FunctionDeclaration) -> Self {
        Self {
            kind: "function".to_string(),
            function: declaration.into(),
        }
    }
}

/// Provider schema output, one variant per provider shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProviderSchemas {
    OpenAi(Vec<OpenAiTool>),
    Anthropic(String),
    Gemini(Vec<FunctionSchema>),
}

impl ProviderSchemas {
    /// Build the view for `provider` from the enabled subset of `functions`.
    pub fn build(provider: SchemaProvider, functions: &[FunctionDeclaration]) -> Self {
        let enabled = functions.iter().filter(|f| f.enabled);
        match provider {
            SchemaProvider::OpenAi => Self::OpenAi(enabled.map(OpenAiTool::from).collect()),
            SchemaProvider::Anthropic => Self::Anthropic(anthropic_prompt(enabled)),
            SchemaProvider::Gemini => Self::Gemini(enabled.map(FunctionSchema::from).collect()),
        }
    }

    /// Empty view for a provider (used when the subsystem is disabled).
    pub const fn empty(provider: SchemaProvider) -> Self {
        match provider {
            SchemaProvider::OpenAi => Self::OpenAi(Vec::new()),
            SchemaProvider::Anthropic => Self::Anthropic(String::new()),
            SchemaProvider::Gemini => Self::Gemini(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::OpenAi(tools) => tools.is_empty(),
            Self::Anthropic(prompt) => prompt.is_empty(),
            Self::Gemini(declarations) => declarations.is_empty(),
        }
    }
}

/// Render functions as a prompt section for models without native tool calling.
///
/// Callers pass only the functions they want listed. Returns an empty string
/// when there are none.
pub fn anthropic_prompt<'a>(functions: impl IntoIterator<Item = &'a FunctionDeclaration>) -> String {
    let mut sections = Vec::new();

    for function in functions {
        let parameters = serde_json::to_string_pretty(&function.parameters)
            .unwrap_or_else(|_| function.parameters.to_string());
        let mut section = format!(
            "Function: {}\nDescription: {}\nParameters:\n{}",
            function.name, function.description, parameters
        );

        if !function.usage_examples.is_empty() {
            section.push_str("\nUsage examples:");
            for example in &function.usage_examples {
                match example.as_str() {
                    Some(text) => section.push_str(&format!("\n- {text}")),
                    None => section.push_str(&format!("\n- {example}")),
                }
            }
        }

        sections.push(section);
    }

    if sections.is_empty() {
        return String::new();
    }

    format!(
        "You can call the following functions:\n\n{}\n\n\
         To call a function, reply with only a JSON object of the form \
         {{\"function\": \"<function name>\", \"arguments\": {{...}}}}.",
        sections.join("\n\n")
    )
}
