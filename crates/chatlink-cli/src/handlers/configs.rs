//! Configs command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;

/// List discoverable configuration documents.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let store = ctx.service().store();
    let names = store.list_available();

    if names.is_empty() {
        println!(
            "No tool configurations found in {}.",
            store.directory().display()
        );
        return Ok(());
    }

    println!("Found {} configuration(s) in {}:\n", names.len(), store.directory().display());
    for name in names {
        let status = match store.load(Some(name.as_str())) {
            Ok(document) => format!("{} function(s)", document.functions.len()),
            Err(e) => format!("invalid: {e}"),
        };
        println!("  {name:<30} {status}");
    }
    Ok(())
}
