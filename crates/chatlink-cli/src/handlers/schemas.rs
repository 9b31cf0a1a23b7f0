//! Schemas command handler.

use anyhow::Result;
use chatlink_core::{ProviderSchemas, SchemaProvider};

use crate::bootstrap::CliContext;
use crate::presentation::print_json;

/// Print the function schemas for `provider`.
///
/// The Anthropic view is a prompt section and is printed as plain text.
pub async fn execute(ctx: &CliContext, provider: SchemaProvider) -> Result<()> {
    let schemas = ctx.service().schemas_for(provider).await;
    if schemas.is_empty() {
        println!("No functions available for {provider}.");
        return Ok(());
    }

    match schemas {
        ProviderSchemas::Anthropic(prompt) => println!("{prompt}"),
        other => print_json(&serde_json::to_value(&other)?)?,
    }
    Ok(())
}
