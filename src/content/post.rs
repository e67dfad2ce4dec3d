//! Post filename and front matter parsing.
//!
//! Pure functions only: raw bytes and a filename go in, a validated
//! [`PostRecord`] or a [`ParseRejection`] comes out. No I/O happens here,
//! which keeps every rule in this module testable without fixtures.
//!
//! # Filename contract
//!
//! `^(\d{8}|\d{14})-(.+?)\.md$`
//!
//! An 8-digit `YYYYMMDD` date or a 14-digit `YYYYMMDDhhmmss` date-time,
//! a hyphen, the slug, and the `.md` suffix. Anything else is rejected.
//!
//! # Front matter contract
//!
//! Zero or more leading `title:` / `tag:` lines, terminated by the first
//! blank line. Everything after the blank line is body content and is
//! never inspected for metadata.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Filename pattern: timestamp prefix, hyphen, slug, `.md` suffix.
static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{8}|\d{14})-(.+?)\.md$").expect("valid filename regex"));

const DATE_FORMAT: &str = "%Y%m%d";
const DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Why a file was excluded from the index.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseRejection {
    #[error("invalid filename pattern")]
    FilenamePattern,

    #[error("invalid timestamp length")]
    TimestampLength,

    #[error("invalid timestamp `{0}`")]
    Timestamp(String),
}

/// One indexed post. Immutable once constructed.
///
/// The body is deliberately absent: content is re-read from
/// `source_file` on demand so the index stays small and edits to a
/// file's body never require anything beyond a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub title: String,
    pub slug: String,
    /// Wall-clock local time taken from the filename prefix.
    pub published: NaiveDateTime,
    /// Lowercased, deduplicated, in author order.
    pub tags: Vec<String>,
    /// Filename relative to the posts directory.
    pub source_file: String,
}

/// Front matter split out of a raw post file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub body: String,
}

/// Parse a full post from its filename and raw content.
pub fn parse_post(file_name: &str, raw: &str) -> Result<PostRecord, ParseRejection> {
    let (published, slug) = parse_filename(file_name)?;
    let meta = parse_front_matter(raw);

    let title = match meta.title {
        Some(title) => title,
        None => title_from_slug(slug),
    };

    Ok(PostRecord {
        title,
        slug: slug.to_owned(),
        published,
        tags: meta.tags,
        source_file: file_name.to_owned(),
    })
}

/// Extract the publish time and slug from a filename.
pub fn parse_filename(file_name: &str) -> Result<(NaiveDateTime, &str), ParseRejection> {
    let captures = FILENAME_RE
        .captures(file_name)
        .ok_or(ParseRejection::FilenamePattern)?;

    let timestamp = captures.get(1).map_or("", |m| m.as_str());
    let slug = captures.get(2).map_or("", |m| m.as_str());

    Ok((parse_timestamp(timestamp)?, slug))
}

/// Parse an 8-digit date (local midnight) or 14-digit date-time prefix.
pub fn parse_timestamp(ts: &str) -> Result<NaiveDateTime, ParseRejection> {
    let parsed = match ts.len() {
        8 => NaiveDate::parse_from_str(ts, DATE_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0)),
        14 => NaiveDateTime::parse_from_str(ts, DATETIME_FORMAT).ok(),
        _ => return Err(ParseRejection::TimestampLength),
    };

    parsed.ok_or_else(|| ParseRejection::Timestamp(ts.to_owned()))
}

/// Split raw content into front matter and body.
///
/// The metadata section is the run of leading non-blank lines; scanning
/// stops at the first blank line. Lines with unrecognized prefixes are
/// ignored rather than treated as an error.
pub fn parse_front_matter(raw: &str) -> FrontMatter {
    let lines: Vec<&str> = raw.split('\n').collect();
    let mut meta = FrontMatter::default();
    let mut body_start = lines.len();

    for (i, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            body_start = i + 1;
            break;
        }

        if let Some(value) = line.strip_prefix("title:") {
            let value = value.trim();
            if !value.is_empty() {
                meta.title = Some(value.to_owned());
            }
        } else if let Some(value) = line.strip_prefix("tag:") {
            for piece in value.split(',') {
                let tag = piece.trim().to_lowercase();
                if !tag.is_empty() && !meta.tags.contains(&tag) {
                    meta.tags.push(tag);
                }
            }
        }
    }

    meta.body = lines[body_start.min(lines.len())..].join("\n");
    meta
}

/// Derive a display title from a slug: `hello-world` → `Hello World`.
pub fn title_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
