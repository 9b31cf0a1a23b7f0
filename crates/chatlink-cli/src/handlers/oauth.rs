//! OAuth command handler.
//!
//! Prints the authorization URL, then reads the code the provider redirected
//! back with from stdin and exchanges it for an access token.

use anyhow::{Context, Result, bail};
use std::io;

use crate::bootstrap::CliContext;

/// Arguments for the OAuth flow.
pub struct OAuthArgs<'a> {
    pub redirect_uri: &'a str,
    pub authorization_url: Option<&'a str>,
    pub token_url: Option<&'a str>,
}

pub async fn execute(ctx: &CliContext, args: OAuthArgs<'_>) -> Result<()> {
    let setup = ctx
        .service()
        .setup_oauth(args.authorization_url, args.redirect_uri)
        .await;
    let Some(url) = setup.authorization_url.filter(|_| setup.success) else {
        bail!(
            "OAuth setup failed: {}",
            setup.error.as_deref().unwrap_or("unknown error")
        );
    };

    println!("Open this URL in a browser and authorize access:\n\n  {url}\n");
    println!("Paste the authorization code: ");
    let mut code = String::new();
    io::stdin()
        .read_line(&mut code)
        .context("Failed to read authorization code")?;
    let code = code.trim();
    if code.is_empty() {
        bail!("No authorization code entered");
    }

    let status = ctx
        .service()
        .complete_oauth(code, args.redirect_uri, args.token_url)
        .await;
    if !status.success {
        bail!(
            "OAuth token exchange failed: {}",
            status.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!("Access token stored for this session.");
    Ok(())
}
