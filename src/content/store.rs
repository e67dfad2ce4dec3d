//! Snapshot store with atomic replacement.
//!
//! Uses `arc-swap` for lock-free reads and atomic snapshot replacement:
//! a reload builds the whole new [`Snapshot`] off to the side, then
//! publishes it in one pointer swap. Readers never see partial state,
//! never block on a rebuild, and an `Arc` they already hold stays valid
//! for as long as they keep it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ContentStore (ArcSwap)                     │
//! │                                                             │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────┐    │
//! │  │  Reader 1   │     │  Reader 2   │     │   Writer    │    │
//! │  │  (request)  │     │  (request)  │     │  (watcher)  │    │
//! │  └──────┬──────┘     └──────┬──────┘     └──────┬──────┘    │
//! │         │                   │                   │           │
//! │         ▼                   ▼                   ▼           │
//! │     current()           current()            reload()       │
//! │    (lock-free)         (lock-free)       (atomic replace)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::content::loader::load_posts;
use crate::content::post::{PostRecord, parse_front_matter};
use crate::content::snapshot::Snapshot;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Single point of truth for the current snapshot of one posts directory.
///
/// Constructing a store performs the first load, so a store in hand
/// always carries a fully-built snapshot; there is no empty state to
/// read from before initialization.
pub struct ContentStore {
    dir: PathBuf,
    snapshot: ArcSwap<Snapshot>,
}

impl ContentStore {
    /// Open a posts directory and build the initial snapshot.
    ///
    /// A directory that cannot be listed fails construction; the caller
    /// decides whether that is fatal (it is, at startup).
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let snapshot = Snapshot::build(load_posts(&dir)?);
        Ok(Self {
            dir,
            snapshot: ArcSwap::from_pointee(snapshot),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current snapshot as an `Arc`. Wait-free; once `reload` returns,
    /// every later call observes the new snapshot or a newer one.
    #[inline]
    pub fn current(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Rescan the directory and publish a fresh snapshot.
    ///
    /// On error (directory unlistable) the previous snapshot stays
    /// published, so readers keep serving stale-but-consistent data.
    /// Returns the post count of the new snapshot.
    pub fn reload(&self) -> Result<usize> {
        let snapshot = Snapshot::build(load_posts(&self.dir)?);
        let count = snapshot.len();
        self.snapshot.store(Arc::new(snapshot));
        Ok(count)
    }

    /// Re-read a post's body from disk, stripping front matter.
    ///
    /// Bodies are not cached in the index; each request reads the source
    /// file fresh. A file deleted between reload and read surfaces here
    /// as a request-local error.
    pub fn read_body(&self, record: &PostRecord) -> Result<String> {
        let path = self.dir.join(&record.source_file);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read post `{}`", path.display()))?;
        Ok(parse_front_matter(&raw).body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store_with(posts: &[(&str, &str)]) -> (TempDir, ContentStore) {
        let tmp = TempDir::new().unwrap();
        for (name, content) in posts {
            fs::write(tmp.path().join(name), content).unwrap();
        }
        let store = ContentStore::open(tmp.path()).unwrap();
        (tmp, store)
    }

    #[test]
    fn test_open_builds_initial_snapshot() {
        let (_tmp, store) = store_with(&[
            ("20240101-a.md", "title: A\n\nbody"),
            ("20240201-b.md", "title: B\n\nbody"),
        ]);
        assert_eq!(store.current().len(), 2);
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(ContentStore::open(tmp.path().join("missing")).is_err());
    }

    #[test]
    fn test_reload_picks_up_new_files() {
        let (tmp, store) = store_with(&[("20240101-a.md", "\n")]);
        assert_eq!(store.current().len(), 1);

        fs::write(tmp.path().join("20240201-b.md"), "title: B\n\nbody").unwrap();
        assert_eq!(store.reload().unwrap(), 2);
        assert_eq!(store.current().len(), 2);
    }

    #[test]
    fn test_failed_reload_retains_previous_snapshot() {
        let tmp = TempDir::new().unwrap();
        let posts = tmp.path().join("posts");
        fs::create_dir(&posts).unwrap();
        fs::write(posts.join("20240101-a.md"), "title: A\n\nbody").unwrap();

        let store = ContentStore::open(&posts).unwrap();
        assert_eq!(store.current().len(), 1);

        fs::remove_dir_all(&posts).unwrap();
        assert!(store.reload().is_err());

        // Stale but available.
        let snapshot = store.current();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.by_slug("a").is_some());
    }

    #[test]
    fn test_held_snapshot_survives_publish() {
        let (tmp, store) = store_with(&[("20240101-a.md", "\n")]);

        let before = store.current();
        fs::remove_file(tmp.path().join("20240101-a.md")).unwrap();
        store.reload().unwrap();

        // In-flight reader still sees the snapshot it grabbed.
        assert_eq!(before.len(), 1);
        assert_eq!(store.current().len(), 0);
    }

    #[test]
    fn test_read_body_strips_front_matter() {
        let (_tmp, store) = store_with(&[("20240101-a.md", "title: A\ntag: x\n\nHello **world**")]);
        let snapshot = store.current();
        let record = snapshot.by_slug("a").unwrap();
        assert_eq!(store.read_body(record).unwrap(), "Hello **world**");
    }

    #[test]
    fn test_read_body_of_deleted_file_is_request_local_error() {
        let (tmp, store) = store_with(&[("20240101-a.md", "\nbody")]);
        let snapshot = store.current();
        let record = snapshot.by_slug("a").unwrap();

        fs::remove_file(tmp.path().join("20240101-a.md")).unwrap();
        assert!(store.read_body(record).is_err());
        // The index itself is untouched until the next reload.
        assert!(store.current().by_slug("a").is_some());
    }

    #[test]
    fn test_rebuild_idempotent() {
        let (_tmp, store) = store_with(&[
            ("20240101-a.md", "title: A\ntag: x, y\n\nbody"),
            ("20240201-b.md", "title: B\ntag: x\n\nbody"),
        ]);

        let first = store.current();
        store.reload().unwrap();
        let second = store.current();

        assert_eq!(first.posts(), second.posts());
        for post in first.posts() {
            assert_eq!(
                second.by_slug(&post.slug).map(|p| &p.source_file),
                Some(&post.source_file)
            );
        }
    }
}
