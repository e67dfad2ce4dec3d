//! Immutable index snapshot and its read-side queries.
//!
//! A [`Snapshot`] is built once from a batch of records, never mutated,
//! and shared behind an `Arc` by the store. All derived structures
//! (chronological order, by-slug, by-tag) are computed at build time, so
//! queries are lookups over frozen data and safe from any thread.

use crate::content::post::PostRecord;
use rustc_hash::FxHashMap;

/// Fully-built set of indexes over the posts directory at one point in time.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Descending by `published`; ties keep loader order (stable sort).
    posts: Vec<PostRecord>,
    /// slug → position in `posts`. On duplicate slugs the later position
    /// in the final order wins.
    by_slug: FxHashMap<String, usize>,
    /// tag → positions in `posts`, in the same descending order.
    by_tag: FxHashMap<String, Vec<usize>>,
}

/// One page of the chronological listing.
#[derive(Debug)]
pub struct Page<'a> {
    pub posts: &'a [PostRecord],
    pub number: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl Snapshot {
    /// Build all indexes from an unordered batch.
    ///
    /// Pure and synchronous; the loader's lexicographic enumeration plus
    /// the stable sort make repeated builds of the same input
    /// structurally identical.
    pub fn build(mut batch: Vec<PostRecord>) -> Self {
        batch.sort_by(|a, b| b.published.cmp(&a.published));

        let mut by_slug = FxHashMap::default();
        let mut by_tag: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (position, post) in batch.iter().enumerate() {
            by_slug.insert(post.slug.clone(), position);
            for tag in &post.tags {
                by_tag.entry(tag.clone()).or_default().push(position);
            }
        }

        Self {
            posts: batch,
            by_slug,
            by_tag,
        }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// All posts, newest first.
    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    /// Page `n` (1-based) of `per_page` posts.
    ///
    /// Page 1 of an empty index is an empty page, not a miss; any other
    /// out-of-range page is `None`.
    pub fn page(&self, n: usize, per_page: usize) -> Option<Page<'_>> {
        if n < 1 || per_page < 1 {
            return None;
        }

        let total = self.posts.len();
        let start = (n - 1) * per_page;
        if start >= total && n != 1 {
            return None;
        }

        let end = (start + per_page).min(total);
        Some(Page {
            posts: &self.posts[start.min(total)..end],
            number: n,
            has_prev: n > 1,
            has_next: end < total,
        })
    }

    pub fn by_slug(&self, slug: &str) -> Option<&PostRecord> {
        self.by_slug.get(slug).map(|&position| &self.posts[position])
    }

    /// Posts carrying `tag`, newest first. Absent or empty buckets are a miss.
    pub fn by_tag(&self, tag: &str) -> Option<Vec<&PostRecord>> {
        let positions = self.by_tag.get(tag)?;
        if positions.is_empty() {
            return None;
        }
        Some(positions.iter().map(|&p| &self.posts[p]).collect())
    }

    /// Case-insensitive substring match over title or any tag, newest first.
    pub fn search(&self, query: &str) -> Vec<&PostRecord> {
        let query = query.to_lowercase();
        self.posts
            .iter()
            .filter(|post| {
                post.title.to_lowercase().contains(&query)
                    || post.tags.iter().any(|tag| tag.contains(&query))
            })
            .collect()
    }
}
