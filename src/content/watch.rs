//! File system watcher for live index reloads.
//!
//! Monitors the posts directory and triggers a full reload through the
//! store on any create/modify/remove event. Reloads are coarse-grained
//! on purpose: reload cost is proportional to directory size, not to
//! event count, and a short debounce window folds a burst of events
//! into a single rescan.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Event Loop                          │
//! │                                                          │
//! │  ┌──────────┐    ┌──────────┐    ┌────────────────────┐  │
//! │  │ notify   │───▶│ Debouncer│───▶│  store.reload()    │  │
//! │  │ events   │    │ (300ms)  │    │  (atomic publish)  │  │
//! │  └──────────┘    └──────────┘    └────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

use crate::content::store::ContentStore;
use crate::log;
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

const DEBOUNCE_MS: u64 = 300;

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Create, modify (covers renames) and remove all invalidate the index.
const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Format path as a filename for log display.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events so one save (often write + rename from the
/// editor) costs one reload.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        if !self.pending.is_empty() {
            self.last_event = Some(Instant::now());
        }
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Start the blocking watcher loop for the store's posts directory.
///
/// Runs until the watcher channel disconnects (process exit). A failed
/// reload is logged and the previous snapshot keeps serving; it is never
/// fatal to the running process.
pub fn watch_for_changes_blocking(store: &ContentStore) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("failed to create file watcher")?;
    watcher
        .watch(store.dir(), RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch `{}`", store.dir().display()))?;

    log!("watch"; "watching {}", store.dir().display());

    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                let changed = debouncer.take();
                let names: Vec<String> = changed.iter().map(|p| display_name(p)).collect();
                log!("watch"; "changed: {}", names.join(", "));

                match store.reload() {
                    Ok(count) => log!("watch"; "reloaded {count} posts"),
                    Err(e) => log!("watch"; "reload failed: {e}"),
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            // Timeout without pending work: keep waiting.
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, RemoveKind};

    fn create_event(path: &str) -> Event {
        Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("posts/.20240101-a.md.swp")));
        assert!(is_temp_file(Path::new("posts/draft.md~")));
        assert!(is_temp_file(Path::new("posts/a.bak")));
        assert!(!is_temp_file(Path::new("posts/20240101-a.md")));
    }

    #[test]
    fn test_is_relevant_event_kinds() {
        assert!(is_relevant(&Event::new(EventKind::Create(CreateKind::File))));
        assert!(is_relevant(&Event::new(EventKind::Remove(RemoveKind::File))));
        assert!(is_relevant(&Event::new(EventKind::Modify(
            notify::event::ModifyKind::Any
        ))));
        assert!(!is_relevant(&Event::new(EventKind::Access(
            notify::event::AccessKind::Any
        ))));
    }

    #[test]
    fn test_debouncer_not_ready_immediately() {
        let mut debouncer = Debouncer::new();
        debouncer.add(create_event("posts/20240101-a.md"));
        // Event just arrived; still inside the debounce window.
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_millis(DEBOUNCE_MS));
    }

    #[test]
    fn test_debouncer_folds_burst_into_one_batch() {
        let mut debouncer = Debouncer::new();
        debouncer.add(create_event("posts/20240101-a.md"));
        debouncer.add(create_event("posts/20240101-a.md"));
        debouncer.add(create_event("posts/20240102-b.md"));

        let batch = debouncer.take();
        assert_eq!(batch.len(), 2);
        assert!(debouncer.take().is_empty());
    }

    #[test]
    fn test_debouncer_ignores_temp_files() {
        let mut debouncer = Debouncer::new();
        debouncer.add(create_event("posts/.a.md.swp"));
        assert!(!debouncer.ready());
        assert!(debouncer.take().is_empty());
        // No pending work: long idle timeout.
        assert_eq!(debouncer.timeout(), Duration::from_secs(60));
    }
}
