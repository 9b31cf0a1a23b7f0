//! CLI bootstrap - the composition root.
//!
//! The tool service is built here from the parsed global options; handlers
//! only ever see the resulting [`CliContext`].

use chatlink_mcp::{McpServiceOptions, McpToolService};
use std::path::PathBuf;

use crate::parser::Cli;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub config_dir: PathBuf,
    pub config_name: Option<String>,
    pub enabled: bool,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config_dir: cli.config_dir.clone(),
            config_name: cli.config_name.clone(),
            enabled: cli.enabled,
        }
    }

    fn service_options(&self) -> McpServiceOptions {
        let options =
            McpServiceOptions::new(&self.config_dir).with_feature_enabled(self.enabled);
        match &self.config_name {
            Some(name) => options.with_config_name(name),
            None => options,
        }
    }
}

/// Composed application context for CLI commands.
pub struct CliContext {
    pub service: McpToolService,
}

impl CliContext {
    pub const fn service(&self) -> &McpToolService {
        &self.service
    }
}

/// Build the tool service described by `config`.
pub fn bootstrap(config: &CliConfig) -> CliContext {
    tracing::debug!(
        config_dir = %config.config_dir.display(),
        enabled = config.enabled,
        "Bootstrapping MCP tool service"
    );
    CliContext {
        service: McpToolService::new(config.service_options()),
    }
}
