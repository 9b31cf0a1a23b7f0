//! Structural checks for raw documents and argument validation for calls.

use chatlink_core::{FieldLimit, ToolConfigDocument};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult, ValidationError};

const SERVER_SECTIONS: [&str; 2] = ["mcp_server", "server"];

/// Check the shape of a raw document before typed parsing.
///
/// Requires the server, `functions` and `tools` sections, a non-empty
/// `base_url`, and a `name` plus `mcp_tool` on every function entry.
/// Function names must be unique.
pub fn check_structure(name: &str, raw: &Value) -> ConfigResult<()> {
    let Some(root) = raw.as_object() else {
        return Err(ConfigError::invalid(name, "document root must be a JSON object"));
    };

    let server = SERVER_SECTIONS
        .iter()
        .find_map(|key| root.get(*key))
        .ok_or_else(|| ConfigError::invalid(name, "missing 'mcp_server' section"))?;

    for section in ["functions", "tools"] {
        if !root.contains_key(section) {
            return Err(ConfigError::invalid(
                name,
                format!("missing '{section}' section"),
            ));
        }
    }

    let base_url = server
        .get("base_url")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if base_url.is_empty() {
        return Err(ConfigError::invalid(
            name,
            "mcp_server.base_url must be a non-empty string",
        ));
    }

    let Some(functions) = root.get("functions").and_then(Value::as_array) else {
        return Err(ConfigError::invalid(name, "'functions' must be a list"));
    };

    let mut seen = HashSet::new();
    for (index, entry) in functions.iter().enumerate() {
        let Some(function_name) = non_empty_str(entry, "name") else {
            return Err(ConfigError::invalid(
                name,
                format!("function #{index} is missing 'name'"),
            ));
        };
        if non_empty_str(entry, "mcp_tool").is_none() {
            return Err(ConfigError::invalid(
                name,
                format!("function '{function_name}' is missing 'mcp_tool'"),
            ));
        }
        if !seen.insert(function_name) {
            return Err(ConfigError::invalid(
                name,
                format!("duplicate function name '{function_name}'"),
            ));
        }
    }

    Ok(())
}

fn non_empty_str<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Validate call arguments against the rule declared for `function`.
///
/// Required fields are checked in declaration order, then field limits in
/// field-name order; the first violation is returned. A function without a
/// rule always passes.
pub fn validate_arguments(
    document: &ToolConfigDocument,
    function: &str,
    arguments: &Map<String, Value>,
) -> Result<(), ValidationError> {
    if document.function(function).is_none() {
        return Err(ValidationError::UnknownFunction(function.to_string()));
    }

    let Some(rule) = document.validation_rule(function) else {
        return Ok(());
    };

    if let Some(missing) = rule
        .required_fields
        .iter()
        .find(|field| !arguments.contains_key(field.as_str()))
    {
        return Err(ValidationError::MissingField(missing.clone()));
    }

    for (field, limit) in &rule.field_limits {
        if let Some(value) = arguments.get(field) {
            check_limit(field, value, limit)?;
        }
    }

    Ok(())
}

fn check_limit(field: &str, value: &Value, limit: &FieldLimit) -> Result<(), ValidationError> {
    if let (Some(max), Some(items)) = (limit.max_items, value.as_array()) {
        if items.len() > max {
            return Err(ValidationError::TooManyItems {
                field: field.to_string(),
                max,
            });
        }
    }

    if let (Some(max), Some(text)) = (limit.max_length, value.as_str()) {
        if text.chars().count() > max {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max,
            });
        }
    }

    if let Some(number) = value.as_f64() {
        if let Some(min) = limit.min.filter(|min| number < *min) {
            return Err(ValidationError::BelowMinimum {
                field: field.to_string(),
                min,
            });
        }
        if let Some(max) = limit.max.filter(|max| number > *max) {
            return Err(ValidationError::AboveMaximum {
                field: field.to_string(),
                max,
            });
        }
    }

    Ok(())
}
