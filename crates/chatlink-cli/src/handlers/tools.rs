//! Tools command handler.

use anyhow::{Result, bail};
use chatlink_core::ToolListing;

use crate::bootstrap::CliContext;
use crate::presentation::{format_optional, print_separator, truncate_string};

/// List tools exposed by the server, one page or all of them.
pub async fn execute(ctx: &CliContext, cursor: Option<&str>, all: bool) -> Result<()> {
    let listing = if all {
        ctx.service().list_all_tools().await
    } else {
        ctx.service().list_available_tools(cursor).await
    };
    display_listing(&listing)
}

fn display_listing(listing: &ToolListing) -> Result<()> {
    if !listing.success {
        bail!(
            "Failed to list tools: {}",
            listing.error.as_deref().unwrap_or("unknown error")
        );
    }

    let tools = listing.tools.as_deref().unwrap_or_default();
    if tools.is_empty() {
        println!("The server exposes no tools.");
    } else {
        println!("{:<30} Description", "Name");
        print_separator(90);
        for tool in tools {
            println!(
                "{:<30} {}",
                truncate_string(&tool.name, 29),
                truncate_string(&format_optional(tool.description.as_deref(), "--"), 59)
            );
        }
    }

    if let Some(cursor) = &listing.next_cursor {
        println!("\nMore tools available; continue with --cursor {cursor}");
    }
    Ok(())
}
