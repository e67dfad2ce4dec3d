//! RSS feed assembly from the current snapshot.
//!
//! Builds an RSS 2.0 channel over the newest posts. Item descriptions
//! come from a fresh read of each post body, flattened to plain text;
//! a body that fails to read falls back to the post title rather than
//! failing the whole feed.

use crate::content::{ContentStore, PostRecord, Snapshot};
use crate::log;
use crate::render::{plain_excerpt, truncate_chars};
use chrono::{Local, NaiveDateTime, TimeZone};
use rss::{Category, Channel, ChannelBuilder, GuidBuilder, ItemBuilder};

/// Newest posts included in the feed.
const FEED_ITEM_LIMIT: usize = 20;

/// Flattened body budget before truncation.
const EXCERPT_CAP: usize = 300;

/// Description length in the feed item.
const DESCRIPTION_LIMIT: usize = 200;

/// Build the RSS channel for the given snapshot.
///
/// `base_url` is scheme + host, no trailing slash.
pub fn build_channel(
    store: &ContentStore,
    snapshot: &Snapshot,
    site_title: &str,
    base_url: &str,
) -> Channel {
    let items: Vec<_> = snapshot
        .posts()
        .iter()
        .take(FEED_ITEM_LIMIT)
        .map(|post| {
            let link = format!("{base_url}/post/{}", post.slug);
            let categories: Vec<Category> = post
                .tags
                .iter()
                .map(|tag| Category {
                    name: tag.clone(),
                    domain: None,
                })
                .collect();

            ItemBuilder::default()
                .title(post.title.clone())
                .description(item_description(store, post))
                .link(link.clone())
                .guid(GuidBuilder::default().permalink(true).value(link).build())
                .pub_date(rfc2822_local(post.published))
                .categories(categories)
                .build()
        })
        .collect();

    ChannelBuilder::default()
        .title(site_title)
        .link(base_url)
        .description(format!("Latest posts from {site_title}"))
        .language("en-us".to_owned())
        .last_build_date(Local::now().to_rfc2822())
        .items(items)
        .build()
}

/// Plain-text description for one item, capped at 200 characters.
fn item_description(store: &ContentStore, post: &PostRecord) -> String {
    let excerpt = match store.read_body(post) {
        Ok(body) => plain_excerpt(&body, EXCERPT_CAP),
        Err(err) => {
            log!("feed"; "skipping body of {}: {err}", post.source_file);
            String::new()
        }
    };

    if excerpt.is_empty() {
        post.title.clone()
    } else {
        truncate_chars(&excerpt, DESCRIPTION_LIMIT)
    }
}

/// RFC 2822 pub date, resolved in the local timezone.
fn rfc2822_local(published: NaiveDateTime) -> String {
    match Local.from_local_datetime(&published).earliest() {
        Some(datetime) => datetime.to_rfc2822(),
        // A wall-clock time skipped by a DST jump has no local
        // representation; fall back to an unzoned rendering.
        None => published.format("%a, %d %b %Y %H:%M:%S +0000").to_string(),
    }
}
