//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quill markdown blog server CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Config file name (default: quill.toml)
    #[arg(short = 'C', long, default_value = "quill.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the blog. Reload the index on post changes automatically
    Serve {
        /// Directory containing posts
        #[arg(short = 'd', long)]
        posts: Option<PathBuf>,

        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// HTTP port number
        #[arg(short, long)]
        port: Option<u16>,

        /// Posts per index page
        #[arg(long = "per-page")]
        per_page: Option<usize>,

        /// Site title
        #[arg(short, long)]
        title: Option<String>,

        /// enable watch
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },

    /// Create a timestamped post file with front matter scaffolding
    New {
        /// Directory containing posts
        #[arg(short = 'd', long)]
        posts: Option<PathBuf>,

        /// Comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,

        /// Post title (remaining words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
    pub const fn is_new(&self) -> bool {
        matches!(self.command, Commands::New { .. })
    }
}
