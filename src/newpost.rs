//! Post scaffolding for `quill new`.
//!
//! Creates a timestamped markdown file with front matter in the posts
//! directory. Pure filesystem write; the running server (if any) picks
//! the file up through its watcher.

use crate::config::SiteConfig;
use anyhow::{Context, Result, bail};
use chrono::Local;
use std::fs;

/// Create `<posts>/<YYYYMMDDhhmmss>-<slug>.md` with front matter.
pub fn create_post(config: &SiteConfig, title: &str, tags: Option<&str>) -> Result<()> {
    let slug = slugify(title);
    if slug.is_empty() {
        bail!("title `{title}` produces an empty slug");
    }

    let timestamp = Local::now().format("%Y%m%d%H%M%S");
    let filename = format!("{timestamp}-{slug}.md");
    let path = config.content.dir.join(&filename);
    if path.exists() {
        bail!("`{}` already exists", path.display());
    }

    let content = format!("title: {title}\ntag: {}\n\n", tags.unwrap_or(""));

    fs::create_dir_all(&config.content.dir).with_context(|| {
        format!(
            "failed to create posts directory `{}`",
            config.content.dir.display()
        )
    })?;
    fs::write(&path, content)
        .with_context(|| format!("failed to create `{}`", path.display()))?;

    println!("Created: {}", path.display());
    Ok(())
}

/// Turn a title into a URL-safe slug.
///
/// Lowercase, spaces to hyphens, keep `[a-z0-9-]`, collapse runs of
/// hyphens, trim hyphens from both ends.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = false;

    for c in title.to_lowercase().chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        match c {
            'a'..='z' | '0'..='9' => {
                slug.push(c);
                last_was_hyphen = false;
            }
            '-' if !last_was_hyphen => {
                slug.push('-');
                last_was_hyphen = true;
            }
            _ => {}
        }
    }

    slug.trim_matches('-').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::post::parse_filename;
    use tempfile::TempDir;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Already -- hyphened  "), "already-hyphened");
        assert_eq!(slugify("C'est l'été!"), "cest-lt"); // non-ascii dropped
        assert_eq!(slugify("100% Rust"), "100-rust");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_create_post_writes_front_matter() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.content.dir = tmp.path().join("posts");

        create_post(&config, "My First Post", Some("rust, blog")).unwrap();

        let entries: Vec<_> = std::fs::read_dir(&config.content.dir)
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(entries.len(), 1);

        let name = entries[0].file_name().into_string().unwrap();
        let (_, slug) = parse_filename(&name).unwrap();
        assert_eq!(slug, "my-first-post");

        let content = std::fs::read_to_string(entries[0].path()).unwrap();
        assert_eq!(content, "title: My First Post\ntag: rust, blog\n\n");
    }

    #[test]
    fn test_create_post_empty_slug_is_error() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.content.dir = tmp.path().to_path_buf();
        assert!(create_post(&config, "???", None).is_err());
    }
}
