//! Info command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::{format_optional, print_json};

/// Print a diagnostic snapshot of the tool service.
pub async fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let info = ctx.service().service_info().await;

    if json {
        return print_json(&serde_json::to_value(&info)?);
    }

    println!("Enabled:            {}", info.enabled);
    println!("Configuration:      {}", format_optional(info.config_name.as_deref(), "--"));
    println!(
        "Loaded at:          {}",
        format_optional(
            info.config_loaded_at.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC")),
            "--"
        )
    );
    println!("Functions:          {}", info.configured_function_count);
    println!("Server URL:         {}", format_optional(info.server_url.as_deref(), "--"));
    println!("Timeout (s):        {}", format_optional(info.timeout, "--"));
    println!("Auth configured:    {}", info.auth_configured);
    println!("Access token:       {}", info.has_access_token);
    println!("Connection open:    {}", info.connection_open);
    println!("Available configs:  {}", info.available_configs.join(", "));
    Ok(())
}
