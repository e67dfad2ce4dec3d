//! HTTP server over the content index.
//!
//! A lightweight `tiny_http` server with the following routes:
//!
//! - `/` and `/page/{n}` — paginated chronological index
//! - `/post/{slug}` — one rendered post (body read lazily per request)
//! - `/tag/{tag}` — posts under a tag
//! - `/search?q=` — substring search over titles and tags
//! - `/rss` — RSS 2.0 feed
//! - `/static/*` — static files with content-type guessing
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │  (File Monitor)  │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!     current()                reload()
//!          │                       │
//!          └───────┬───────────────┘
//!                  ▼
//!            ContentStore
//! ```
//!
//! Request handlers only ever read the store; the watcher thread owns
//! the write side. A request grabs one snapshot up front and uses it
//! for its whole lifetime, so a concurrent reload never changes what a
//! single response sees.

use crate::{
    config::SiteConfig,
    content::{ContentStore, watch_for_changes_blocking},
    feed, log, render,
};
use anyhow::{Context, Result};
use std::{
    fs,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

/// Directory served under `/static/`.
const STATIC_DIR: &str = "static";

/// Start the blog server.
///
/// This function:
/// 1. Builds the initial snapshot (a bad posts directory is fatal here)
/// 2. Binds to the configured interface and port (with auto-retry)
/// 3. Sets up Ctrl+C handler for graceful shutdown
/// 4. Spawns the watcher thread (if enabled)
/// 5. Enters the request handling loop
///
/// The server blocks until Ctrl+C is received.
pub fn serve_site(config: &SiteConfig) -> Result<()> {
    let store = Arc::new(ContentStore::open(&config.content.dir)?);
    log!("load"; "loaded {} posts", store.current().len());

    let interface: IpAddr = config.serve.interface.parse()?;
    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    // Spawn the watcher thread; it owns the only writer handle.
    if config.serve.watch {
        let store = Arc::clone(&store);
        std::thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking(&store) {
                log!("watch"; "{err}");
            }
        });
    }

    // Handle requests in main thread (blocks until Ctrl+C)
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &store, config) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < max_retries => {
                // Will retry silently
                continue;
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed to bind after {} attempts (ports {}-{}): {}",
                    max_retries,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

// ============================================================================
// Routing
// ============================================================================

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Index,
    Page(usize),
    Post(&'a str),
    Tag(&'a str),
    Search,
    Rss,
    Static(&'a str),
    NotFound,
}

/// Map a decoded, query-stripped request path to a route.
fn route(path: &str) -> Route<'_> {
    if let Some(rest) = path.strip_prefix("/static/") {
        return Route::Static(rest);
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] => Route::Index,
        ["page", n] => match n.parse::<usize>() {
            Ok(n) if n >= 1 => Route::Page(n),
            _ => Route::NotFound,
        },
        ["post", slug] => Route::Post(slug),
        ["tag", tag] => Route::Tag(tag),
        ["search"] => Route::Search,
        ["rss"] => Route::Rss,
        _ => Route::NotFound,
    }
}

/// Extract a query parameter from a raw request URL.
fn query_param(url: &str, key: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    for pair in query.split('&') {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        if k == key {
            let v = v.replace('+', " ");
            return Some(
                urlencoding::decode(&v)
                    .map(std::borrow::Cow::into_owned)
                    .unwrap_or(v),
            );
        }
    }
    None
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
///
/// Every failure in here is request-local: a missing slug, tag or page
/// renders 404; a body-read failure renders 500. The shared index is
/// never touched.
fn handle_request(request: Request, store: &ContentStore, config: &SiteConfig) -> Result<()> {
    let url = request.url().to_owned();
    let decoded = urlencoding::decode(&url)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| url.clone());
    let path = decoded.split('?').next().unwrap_or(&decoded).to_owned();

    // One snapshot per request: a reload mid-request cannot change what
    // this response sees.
    let snapshot = store.current();
    let site_title = &config.site.title;

    match route(&path) {
        Route::Index => match snapshot.page(1, config.content.per_page) {
            Some(page) => serve_html(request, render::index_page(&page, site_title)),
            None => serve_not_found(request, site_title),
        },
        Route::Page(n) => match snapshot.page(n, config.content.per_page) {
            Some(page) => serve_html(request, render::index_page(&page, site_title)),
            None => {
                log!("serve"; "page out of range: {n}");
                serve_not_found(request, site_title)
            }
        },
        Route::Post(slug) => match snapshot.by_slug(slug) {
            Some(post) => match store.read_body(post) {
                Ok(body) => {
                    let html = render::markdown_to_html(&body);
                    serve_html(request, render::post_page(post, &html, site_title))
                }
                Err(err) => {
                    log!("serve"; "{err}");
                    serve_error(request, "cannot read post")
                }
            },
            None => {
                log!("serve"; "post not found: {slug}");
                serve_not_found(request, site_title)
            }
        },
        Route::Tag(tag) => match snapshot.by_tag(tag) {
            Some(posts) => serve_html(request, render::tag_page(tag, &posts, site_title)),
            None => {
                log!("serve"; "tag not found: {tag}");
                serve_not_found(request, site_title)
            }
        },
        Route::Search => {
            let query = query_param(&url, "q")
                .map(|q| q.trim().to_lowercase())
                .unwrap_or_default();
            if query.is_empty() {
                return serve_redirect(request, "/");
            }
            let results = snapshot.search(&query);
            serve_html(request, render::search_page(&query, &results, site_title))
        }
        Route::Rss => {
            let base_url = base_url(&request);
            let channel = feed::build_channel(store, &snapshot, site_title, &base_url);
            serve_xml(request, channel.to_string())
        }
        Route::Static(rest) => serve_static(request, rest, site_title),
        Route::NotFound => serve_not_found(request, site_title),
    }
}

/// Scheme + host for feed links, taken from the Host header.
fn base_url(request: &Request) -> String {
    let host = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Host"))
        .map(|h| h.value.to_string())
        .unwrap_or_else(|| "localhost".to_owned());
    format!("http://{host}")
}

// ============================================================================
// Static Files
// ============================================================================

/// Serve a file from the static directory.
///
/// The request path is rebuilt from its normal components only, so
/// `..` traversal cannot escape the static root.
fn serve_static(request: Request, rest: &str, site_title: &str) -> Result<()> {
    let mut local = PathBuf::from(STATIC_DIR);
    for component in Path::new(rest).components() {
        match component {
            Component::Normal(part) => local.push(part),
            _ => return serve_not_found(request, site_title),
        }
    }

    if !local.is_file() {
        return serve_not_found(request, site_title);
    }

    let content =
        fs::read(&local).with_context(|| format!("failed to read {}", local.display()))?;
    let response = Response::from_data(content)
        .with_header(header("Content-Type", guess_content_type(&local)));
    request.respond(response)?;
    Ok(())
}

/// Guess MIME content type from file extension.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Response Helpers
// ============================================================================

fn header(field: &str, value: &str) -> Header {
    Header::from_bytes(field, value).expect("static header values are valid")
}

fn serve_html(request: Request, content: String) -> Result<()> {
    let response = Response::from_string(content)
        .with_header(header("Content-Type", "text/html; charset=utf-8"));
    request.respond(response)?;
    Ok(())
}

fn serve_xml(request: Request, content: String) -> Result<()> {
    let response = Response::from_string(content)
        .with_header(header("Content-Type", "application/rss+xml; charset=utf-8"));
    request.respond(response)?;
    Ok(())
}

fn serve_not_found(request: Request, site_title: &str) -> Result<()> {
    let response = Response::from_string(render::not_found_page(site_title))
        .with_header(header("Content-Type", "text/html; charset=utf-8"))
        .with_status_code(StatusCode(404));
    request.respond(response)?;
    Ok(())
}

fn serve_error(request: Request, message: &str) -> Result<()> {
    let response = Response::from_string(message)
        .with_header(header("Content-Type", "text/plain; charset=utf-8"))
        .with_status_code(StatusCode(500));
    request.respond(response)?;
    Ok(())
}

fn serve_redirect(request: Request, location: &str) -> Result<()> {
    let response = Response::empty(StatusCode(303)).with_header(header("Location", location));
    request.respond(response)?;
    Ok(())
}
