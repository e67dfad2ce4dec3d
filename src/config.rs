//! Site configuration: `quill.toml` plus CLI overrides.
//!
//! The file is optional; every field has a default, and CLI flags win
//! over file values. Unknown fields are rejected so typos surface as
//! errors instead of silently-ignored settings.
//!
//! # Example
//! ```toml
//! [site]
//! title = "My Blog"
//!
//! [content]
//! dir = "posts"
//! per_page = 5
//!
//! [serve]
//! interface = "127.0.0.1"
//! port = 8080
//! watch = true
//! ```

use crate::cli::{Cli, Commands};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

mod defaults {
    use std::path::PathBuf;

    pub fn title() -> String {
        "Quill".to_owned()
    }
    pub fn posts_dir() -> PathBuf {
        PathBuf::from("posts")
    }
    pub const fn per_page() -> usize {
        5
    }
    pub fn interface() -> String {
        "127.0.0.1".to_owned()
    }
    pub const fn port() -> u16 {
        8080
    }
    pub const fn r#true() -> bool {
        true
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub content: ContentSection,
    #[serde(default)]
    pub serve: ServeSection,
}

/// `[site]` section - identity of the blog.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Display title used in page headers and the RSS channel.
    #[serde(default = "defaults::title")]
    pub title: String,
}

/// `[content]` section - where posts live and how they paginate.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentSection {
    /// Directory of timestamp-prefixed markdown files.
    #[serde(default = "defaults::posts_dir")]
    pub dir: PathBuf,

    /// Posts per index page.
    #[serde(default = "defaults::per_page")]
    pub per_page: usize,
}

/// `[serve]` section - development/production server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeSection {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    #[serde(default = "defaults::interface")]
    pub interface: String,

    /// HTTP port number (default: 8080).
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Enable the file watcher for live index reloads.
    #[serde(default = "defaults::r#true")]
    pub watch: bool,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: defaults::title(),
        }
    }
}

impl Default for ContentSection {
    fn default() -> Self {
        Self {
            dir: defaults::posts_dir(),
            per_page: defaults::per_page(),
        }
    }
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            interface: defaults::interface(),
            port: defaults::port(),
            watch: defaults::r#true(),
        }
    }
}

impl SiteConfig {
    /// Parse configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply CLI flags on top of file values.
    pub fn update_with_cli(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Serve {
                posts,
                interface,
                port,
                per_page,
                title,
                watch,
            } => {
                if let Some(posts) = posts {
                    self.content.dir = posts.clone();
                }
                if let Some(interface) = interface {
                    self.serve.interface = interface.clone();
                }
                if let Some(port) = port {
                    self.serve.port = *port;
                }
                if let Some(per_page) = per_page {
                    self.content.per_page = *per_page;
                }
                if let Some(title) = title {
                    self.site.title = title.clone();
                }
                if let Some(watch) = watch {
                    self.serve.watch = *watch;
                }
            }
            Commands::New { posts, .. } => {
                if let Some(posts) = posts {
                    self.content.dir = posts.clone();
                }
            }
        }
    }

    /// Validate settings before serving.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.per_page < 1 {
            return Err(ConfigError::Validation(
                "content.per_page must be at least 1".to_owned(),
            ));
        }
        if self.serve.interface.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "serve.interface is not a valid IP address: `{}`",
                self.serve.interface
            )));
        }
        Ok(())
    }
}
