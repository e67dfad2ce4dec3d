//! Quill - a file-backed markdown blog server with live reload.

mod cli;
mod config;
mod content;
mod feed;
mod logger;
mod newpost;
mod render;
mod serve;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use serve::serve_site;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Serve { .. } => serve_site(&config),
        Commands::New { tags, title, .. } => {
            newpost::create_post(&config, &title.join(" "), tags.as_deref())
        }
    }
}

/// Load and validate configuration from the config file and CLI arguments.
///
/// The config file is optional; defaults apply when it is absent.
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let mut config = if cli.config.exists() {
        SiteConfig::from_path(&cli.config)?
    } else {
        SiteConfig::default()
    };
    config.update_with_cli(cli);
    config.validate()?;

    Ok(config)
}
