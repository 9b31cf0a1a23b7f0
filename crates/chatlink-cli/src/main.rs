//! CLI entry point - the composition root.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use chatlink_cli::handlers::oauth::OAuthArgs;
use chatlink_cli::{Cli, CliConfig, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(&CliConfig::from_cli(&cli));

    match command {
        Commands::Configs => handlers::configs::execute(&ctx)?,
        Commands::Info { json } => handlers::info::execute(&ctx, *json).await?,
        Commands::Schemas { provider } => handlers::schemas::execute(&ctx, *provider).await?,
        Commands::Invoke { function, args } => {
            handlers::invoke::execute(&ctx, function, args.as_deref()).await?;
        }
        Commands::Tools { cursor, all } => {
            handlers::tools::execute(&ctx, cursor.as_deref(), *all).await?;
        }
        Commands::Health => handlers::server::health(&ctx).await?,
        Commands::Init => handlers::server::init(&ctx).await?,
        Commands::Oauth {
            redirect_uri,
            authorization_url,
            token_url,
        } => {
            let args = OAuthArgs {
                redirect_uri,
                authorization_url: authorization_url.as_deref(),
                token_url: token_url.as_deref(),
            };
            handlers::oauth::execute(&ctx, args).await?;
        }
    }

    ctx.service().close().await;
    Ok(())
}
