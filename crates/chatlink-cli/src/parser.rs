//! Main CLI parser and top-level argument handling.

use clap::Parser;
use std::path::PathBuf;

use crate::commands::Commands;

/// Inspect and exercise MCP tool configurations from the terminal.
#[derive(Parser)]
#[command(name = "chatlink")]
#[command(about = "Call MCP tools the way the chat backend does")]
#[command(version)]
pub struct Cli {
    /// Directory holding tool-configuration documents
    #[arg(
        long = "config-dir",
        env = "CHATLINK_MCP_CONFIG_DIR",
        default_value = "config/mcp",
        global = true
    )]
    pub config_dir: PathBuf,

    /// Configuration document to use (defaults to the first one found)
    #[arg(long = "config", global = true)]
    pub config_name: Option<String>,

    /// Feature flag for tool calling
    #[arg(
        long = "enabled",
        env = "CHATLINK_MCP_ENABLED",
        default_value_t = true,
        action = clap::ArgAction::Set,
        global = true
    )]
    pub enabled: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Commands;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "chatlink",
            "--config-dir",
            "/tmp/mcp",
            "--config",
            "search",
            "--enabled",
            "false",
            "-v",
            "configs",
        ]);
        assert_eq!(cli.config_dir, PathBuf::from("/tmp/mcp"));
        assert_eq!(cli.config_name.as_deref(), Some("search"));
        assert!(!cli.enabled);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::Configs)));
    }

    #[test]
    fn test_invoke_args() {
        let cli = Cli::parse_from([
            "chatlink",
            "invoke",
            "search_data",
            "--args",
            r#"{"query": "rust"}"#,
        ]);
        match cli.command {
            Some(Commands::Invoke { function, args }) => {
                assert_eq!(function, "search_data");
                assert_eq!(args.as_deref(), Some(r#"{"query": "rust"}"#));
            }
            _ => panic!("expected invoke command"),
        }
    }

    #[test]
    fn test_schemas_provider_parsing() {
        let cli = Cli::parse_from(["chatlink", "schemas", "--provider", "gemini"]);
        match cli.command {
            Some(Commands::Schemas { provider }) => {
                assert_eq!(provider, chatlink_core::SchemaProvider::Gemini);
            }
            _ => panic!("expected schemas command"),
        }

        assert!(Cli::try_parse_from(["chatlink", "schemas", "--provider", "llama"]).is_err());
    }
}
