//! Content index and hot-reload subsystem.
//!
//! The write side flows watcher → loader → snapshot build → store
//! publish; the read side is the query surface on [`Snapshot`] reached
//! through [`ContentStore::current`]. Nothing in here knows about HTTP.

pub mod loader;
pub mod post;
pub mod snapshot;
pub mod store;
pub mod watch;

pub use post::PostRecord;
pub use snapshot::{Page, Snapshot};
pub use store::ContentStore;
pub use watch::watch_for_changes_blocking;
