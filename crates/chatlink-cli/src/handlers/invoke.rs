//! Invoke command handler.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

use crate::bootstrap::CliContext;
use crate::presentation::print_json;

/// Parse `--args` into an argument object; absent means no arguments.
pub fn parse_arguments(raw: Option<&str>) -> Result<Map<String, Value>> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    let value: Value = serde_json::from_str(raw).context("--args is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("--args must be a JSON object, got {other}"),
    }
}

/// Invoke `function` and print the normalized result.
///
/// A failed call prints its fallback message and exits with an error.
pub async fn execute(ctx: &CliContext, function: &str, args: Option<&str>) -> Result<()> {
    let arguments = parse_arguments(args)?;
    let result = ctx.service().invoke(function, arguments).await;

    print_json(&serde_json::to_value(&result)?)?;

    if !result.success {
        if let Some(fallback) = &result.fallback_message {
            eprintln!("\n{fallback}");
        }
        bail!(
            "Tool call failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_arguments_absent() {
        assert!(parse_arguments(None).unwrap().is_empty());
    }

    #[test]
    fn test_parse_arguments_object() {
        let args = parse_arguments(Some(r#"{"query": "rust", "limit": 5}"#)).unwrap();
        assert_eq!(args["query"], json!("rust"));
        assert_eq!(args["limit"], json!(5));
    }

    #[test]
    fn test_parse_arguments_rejects_non_objects() {
        assert!(parse_arguments(Some("[1, 2]")).is_err());
        assert!(parse_arguments(Some("not json")).is_err());
    }
}
