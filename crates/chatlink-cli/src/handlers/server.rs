//! Health and init command handlers.

use anyhow::{Result, bail};

use crate::bootstrap::CliContext;

/// Check server health.
pub async fn health(ctx: &CliContext) -> Result<()> {
    let report = ctx.service().health_check().await;
    if report.healthy {
        println!("MCP server is healthy.");
        Ok(())
    } else {
        bail!(
            "MCP server is unhealthy: {}",
            report.error.as_deref().unwrap_or("unknown error")
        )
    }
}

/// Negotiate a session and print what the server reported.
pub async fn init(ctx: &CliContext) -> Result<()> {
    let status = ctx.service().initialize_connection().await;
    if !status.success {
        bail!(
            "Initialization failed: {}",
            status.error.as_deref().unwrap_or("unknown error")
        );
    }

    let info = ctx.service().service_info().await;
    println!(
        "Connected to {} (protocol {}).",
        info.server_name.as_deref().unwrap_or("MCP server"),
        info.negotiated_protocol_version.as_deref().unwrap_or("unknown")
    );
    Ok(())
}
