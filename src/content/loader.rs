//! Directory loader: scan the posts directory into an unordered batch.
//!
//! Per-file problems (unreadable file, bad filename, bad timestamp) are
//! logged and skipped; only a failure to list the directory itself fails
//! the load, so one broken file can never take the whole index down.

use crate::content::post::{PostRecord, parse_post};
use crate::log;
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Load every valid post in `dir` (non-recursive).
///
/// Entries are processed in lexicographic filename order. Directory
/// enumeration order is filesystem-dependent, so sorting here is what
/// makes duplicate-slug resolution (last wins) deterministic.
pub fn load_posts(dir: &Path) -> Result<Vec<PostRecord>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read posts directory `{}`", dir.display()))?;

    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort_unstable();

    let mut posts = Vec::with_capacity(names.len());
    for name in names {
        let raw = match fs::read_to_string(dir.join(&name)) {
            Ok(raw) => raw,
            Err(err) => {
                log!("load"; "skip {name}: read error: {err}");
                continue;
            }
        };

        match parse_post(&name, &raw) {
            Ok(record) => posts.push(record),
            Err(rejection) => log!("load"; "skip {name}: {rejection}"),
        }
    }

    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_post(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_load_valid_posts() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "20240101-first.md", "title: First\n\nbody");
        write_post(tmp.path(), "20240201-second.md", "title: Second\ntag: a\n\nbody");

        let posts = load_posts(tmp.path()).unwrap();
        assert_eq!(posts.len(), 2);
    }

    #[test]
    fn test_invalid_files_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "badname.md", "title: Bad\n\nbody");
        write_post(tmp.path(), "notes.txt", "whatever");
        write_post(tmp.path(), "20240101-good.md", "title: Good\n\nbody");

        let posts = load_posts(tmp.path()).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "good");
    }

    #[test]
    fn test_subdirectories_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("20240101-dir.md")).unwrap();
        write_post(tmp.path(), "20240102-real.md", "\n");

        let posts = load_posts(tmp.path()).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "real");
    }

    #[test]
    fn test_missing_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(load_posts(&missing).is_err());
    }

    #[test]
    fn test_enumeration_is_lexicographic() {
        let tmp = TempDir::new().unwrap();
        // Same slug under two filenames; lexicographically later file wins
        // downstream, regardless of creation order.
        write_post(tmp.path(), "20240105-dup.md", "title: Later\n\nbody");
        write_post(tmp.path(), "20240101-dup.md", "title: Earlier\n\nbody");

        let posts = load_posts(tmp.path()).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "Earlier");
        assert_eq!(posts[1].title, "Later");
    }

    #[test]
    fn test_empty_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(load_posts(tmp.path()).unwrap().is_empty());
    }
}
