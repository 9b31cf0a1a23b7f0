//! Available subcommands.

use chatlink_core::SchemaProvider;
use clap::Subcommand;

/// Operations of the tool-calling service exposed on the command line.
#[derive(Subcommand)]
pub enum Commands {
    /// List discoverable configuration documents
    Configs,

    /// Show service configuration and connection state
    Info {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print function schemas for an LLM provider
    Schemas {
        /// openai, anthropic or gemini
        #[arg(short, long, default_value = "openai")]
        provider: SchemaProvider,
    },

    /// Invoke a configured function
    Invoke {
        /// Function name as declared in the configuration
        function: String,
        /// Arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,
    },

    /// List tools exposed by the MCP server
    Tools {
        /// Resume listing from a pagination cursor
        #[arg(long, conflicts_with = "all")]
        cursor: Option<String>,
        /// Follow pagination until every tool is listed
        #[arg(long)]
        all: bool,
    },

    /// Check server health
    Health,

    /// Negotiate protocol version and capabilities with the server
    Init,

    /// Run the OAuth2 authorization-code flow
    Oauth {
        /// Redirect URI registered for the client
        #[arg(long, default_value = "http://localhost:8765/callback")]
        redirect_uri: String,
        /// Authorization endpoint (defaults to the configured one)
        #[arg(long)]
        authorization_url: Option<String>,
        /// Token endpoint (defaults to the configured one)
        #[arg(long)]
        token_url: Option<String>,
    },
}
