//! HTML rendering: markdown conversion, page assembly, excerpts.
//!
//! The page shell is embedded at compile time and filled in with simple
//! `{placeholder}` replacement; page bodies are assembled in code with
//! all dynamic text HTML-escaped. Markdown conversion itself is a pure
//! function over the post body.

use crate::content::{Page, PostRecord};
use pulldown_cmark::{Options, Parser, html};

/// Page shell (embedded at compile time)
const LAYOUT_TEMPLATE: &str = include_str!("embed/layout.html");

/// Date format used in post listings and post headers.
const DISPLAY_DATE: &str = "%Y-%m-%d";

/// Convert a markdown body to HTML. Pure: text in, HTML out.
pub fn markdown_to_html(text: &str) -> String {
    let parser = Parser::new_ext(text, Options::empty());
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Escape text for embedding into HTML content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap a rendered body in the page shell.
fn layout(page_title: &str, site_title: &str, content: &str) -> String {
    LAYOUT_TEMPLATE
        .replace("{title}", &escape_html(page_title))
        .replace("{site_title}", &escape_html(site_title))
        .replace("{content}", content)
}

/// One `<article>` summary per post: linked title, date, tag links.
fn post_list<'a>(posts: impl IntoIterator<Item = &'a PostRecord>) -> String {
    let mut out = String::new();
    for post in posts {
        let tags = post
            .tags
            .iter()
            .map(|tag| {
                format!(
                    r#"<a href="/tag/{}">#{}</a>"#,
                    escape_html(tag),
                    escape_html(tag)
                )
            })
            .collect::<Vec<_>>()
            .join(" ");

        out.push_str(&format!(
            "<article class=\"summary\">\n\
             <h2><a href=\"/post/{slug}\">{title}</a></h2>\n\
             <p class=\"meta\">{date} {tags}</p>\n\
             </article>\n",
            slug = escape_html(&post.slug),
            title = escape_html(&post.title),
            date = post.published.format(DISPLAY_DATE),
            tags = tags,
        ));
    }
    out
}

/// Chronological index with prev/next pager.
pub fn index_page(page: &Page<'_>, site_title: &str) -> String {
    let mut content = post_list(page.posts.iter());

    if page.has_prev || page.has_next {
        let prev = if page.has_prev {
            let href = if page.number == 2 {
                "/".to_owned()
            } else {
                format!("/page/{}", page.number - 1)
            };
            format!(r#"<a href="{href}">&larr; newer</a>"#)
        } else {
            "<span></span>".to_owned()
        };
        let next = if page.has_next {
            format!(r#"<a href="/page/{}">older &rarr;</a>"#, page.number + 1)
        } else {
            "<span></span>".to_owned()
        };
        content.push_str(&format!("<nav class=\"pager\">{prev}{next}</nav>\n"));
    }

    layout(site_title, site_title, &content)
}

/// A single rendered post.
pub fn post_page(post: &PostRecord, body_html: &str, site_title: &str) -> String {
    let tags = post
        .tags
        .iter()
        .map(|tag| {
            format!(
                r#"<a href="/tag/{}">#{}</a>"#,
                escape_html(tag),
                escape_html(tag)
            )
        })
        .collect::<Vec<_>>()
        .join(" ");

    let content = format!(
        "<article>\n\
         <h1>{title}</h1>\n\
         <p class=\"meta\">{date} {tags}</p>\n\
         {body_html}\n\
         </article>\n",
        title = escape_html(&post.title),
        date = post.published.format(DISPLAY_DATE),
    );

    layout(
        &format!("{} · {}", post.title, site_title),
        site_title,
        &content,
    )
}

/// All posts under one tag.
pub fn tag_page(tag: &str, posts: &[&PostRecord], site_title: &str) -> String {
    let content = format!(
        "<h1>Tag: {}</h1>\n{}",
        escape_html(tag),
        post_list(posts.iter().copied())
    );
    layout(&format!("Tag: {tag} · {site_title}"), site_title, &content)
}

/// Search results (possibly empty).
pub fn search_page(query: &str, posts: &[&PostRecord], site_title: &str) -> String {
    let results = if posts.is_empty() {
        "<p>No posts found.</p>\n".to_owned()
    } else {
        post_list(posts.iter().copied())
    };
    let content = format!("<h1>Search: {}</h1>\n{}", escape_html(query), results);
    layout(&format!("Search: {query}"), site_title, &content)
}

/// Rendered 404 page.
pub fn not_found_page(site_title: &str) -> String {
    layout(
        &format!("Page Not Found · {site_title}"),
        site_title,
        "<h1>404</h1>\n<p>Page not found. <a href=\"/\">Back home</a>.</p>\n",
    )
}

/// Flatten a markdown body to plain text for feed descriptions.
///
/// Headings and code fences are dropped, inline emphasis markers are
/// stripped, and accumulation stops once `cap` characters are gathered.
pub fn plain_excerpt(body: &str, cap: usize) -> String {
    let mut pieces: Vec<String> = Vec::new();
    let mut length = 0;

    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("```") {
            continue;
        }

        let line = line.replace("**", "").replace('*', "").replace('`', "");
        if line.is_empty() {
            continue;
        }

        length += line.chars().count() + 1;
        pieces.push(line);
        if length > cap {
            break;
        }
    }

    pieces.join(" ")
}

/// Truncate to `max_chars` characters, appending `...` when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::post::parse_post;

    fn post(name: &str, raw: &str) -> PostRecord {
        parse_post(name, raw).unwrap()
    }

    #[test]
    fn test_markdown_to_html() {
        let html = markdown_to_html("# Title\n\nSome **bold** text");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"a" & 'b'</b>"#),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_post_page_escapes_title() {
        let record = post("20240101-xss.md", "title: <script>alert(1)</script>\n\nbody");
        let html = post_page(&record, "<p>body</p>", "Site");
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_post_page_keeps_rendered_body() {
        let record = post("20240101-a.md", "title: A\n\nbody");
        let html = post_page(&record, "<p>rendered <em>body</em></p>", "Site");
        assert!(html.contains("<p>rendered <em>body</em></p>"));
        assert!(html.contains("2024-01-01"));
    }

    #[test]
    fn test_index_page_links_posts_and_tags() {
        let records = vec![post("20240101-hello.md", "title: Hello\ntag: rust\n\nbody")];
        let page = Page {
            posts: &records,
            number: 1,
            has_prev: false,
            has_next: true,
        };
        let html = index_page(&page, "Site");
        assert!(html.contains(r#"<a href="/post/hello">Hello</a>"#));
        assert!(html.contains(r#"<a href="/tag/rust">#rust</a>"#));
        assert!(html.contains(r#"<a href="/page/2">"#));
        assert!(!html.contains("newer"));
    }

    #[test]
    fn test_pager_prev_to_home() {
        let records = vec![post("20240101-a.md", "\n")];
        let page = Page {
            posts: &records,
            number: 2,
            has_prev: true,
            has_next: false,
        };
        let html = index_page(&page, "Site");
        assert!(html.contains(r#"<a href="/">"#));
    }

    #[test]
    fn test_search_page_empty_results() {
        let html = search_page("nothing", &[], "Site");
        assert!(html.contains("No posts found"));
    }

    #[test]
    fn test_plain_excerpt_strips_markdown() {
        let body = "# Heading\n\nSome **bold** and `code` text\n\n```\nfenced\n```\nmore *words*";
        let excerpt = plain_excerpt(body, 300);
        assert_eq!(excerpt, "Some bold and code text more words");
    }

    #[test]
    fn test_plain_excerpt_caps_length() {
        let body = "one two three\n".repeat(100);
        let excerpt = plain_excerpt(&body, 30);
        assert!(excerpt.chars().count() < 60);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("hello world", 5), "hello...");
        // Multibyte safety: no panic mid-character.
        assert_eq!(truncate_chars("€€€€", 2), "€€...");
    }
}
