//! Metadata extraction (title, description, Open Graph, Twitter cards,
//! JSON-LD) and link discovery/canonicalisation/filtering — the parts of
//! the scrape pipeline that read the DOM without rewriting it.

use scraper::{Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// Structured metadata lifted from `<head>` and embedded JSON-LD blocks.
#[derive(Debug, Clone, Default)]
pub struct PageMetadata {
    pub open_graph: BTreeMap<String, String>,
    pub twitter: BTreeMap<String, String>,
    pub json_ld: Vec<serde_json::Value>,
}

fn select_first_attr(doc: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

/// `<title>`, or the first `<h1>` when the page has no title tag.
pub fn extract_title(doc: &Html) -> String {
    if let Ok(selector) = Selector::parse("title") {
        if let Some(el) = doc.select(&selector).next() {
            let text = el.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return text;
            }
        }
    }
    if let Ok(selector) = Selector::parse("h1") {
        if let Some(el) = doc.select(&selector).next() {
            return el.text().collect::<String>().trim().to_string();
        }
    }
    String::new()
}

pub fn extract_description(doc: &Html) -> Option<String> {
    select_first_attr(doc, r#"meta[name="description"]"#, "content")
        .or_else(|| select_first_attr(doc, r#"meta[property="og:description"]"#, "content"))
        .filter(|s| !s.trim().is_empty())
}

/// `<html lang="...">`, falling back to `Content-Language`.
pub fn extract_language(doc: &Html) -> Option<String> {
    select_first_attr(doc, "html", "lang")
        .or_else(|| select_first_attr(doc, r#"meta[http-equiv="Content-Language" i]"#, "content"))
        .filter(|s| !s.trim().is_empty())
}

pub fn extract_page_metadata(doc: &Html) -> PageMetadata {
    let mut metadata = PageMetadata::default();

    if let Ok(selector) = Selector::parse(r#"meta[property^="og:"]"#) {
        for el in doc.select(&selector) {
            if let (Some(prop), Some(content)) =
                (el.value().attr("property"), el.value().attr("content"))
            {
                if let Some(key) = prop.strip_prefix("og:") {
                    metadata.open_graph.insert(key.to_string(), content.to_string());
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse(r#"meta[name^="twitter:"]"#) {
        for el in doc.select(&selector) {
            if let (Some(name), Some(content)) = (el.value().attr("name"), el.value().attr("content")) {
                if let Some(key) = name.strip_prefix("twitter:") {
                    metadata.twitter.insert(key.to_string(), content.to_string());
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) {
        for el in doc.select(&selector) {
            let raw = el.text().collect::<String>();
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw.trim()) {
                metadata.json_ld.push(value);
            }
        }
    }

    metadata
}

/// Schemes that never resolve to a fetchable document.
const SKIPPED_SCHEMES: &[&str] = &["javascript", "mailto", "tel", "data"];

/// Extensions the default blacklist drops — binary/asset links a
/// document crawler has no use for.
pub const DEFAULT_EXTENSION_BLACKLIST: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "bmp", "pdf", "zip", "gz", "tar", "css",
    "js", "mp3", "mp4", "mov", "avi", "woff", "woff2", "ttf", "eot",
];

/// Resolve every `<a href>` against `base`, drop unfetchable schemes and
/// blacklisted file extensions, and canonicalise what's left. Order is
/// preserved; duplicates are not removed here — that's the crawler's
/// `visited` set's job, scoped per crawl job rather than per page.
pub fn extract_links(doc: &Html, base: &Url, extension_blacklist: &[String]) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    doc.select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| resolve_link(base, href))
        .filter(|url| link_allowed(url, extension_blacklist))
        .map(|url| quaero_core::canonicalize(url.as_str()))
        .collect()
}

fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    base.join(trimmed).ok()
}

fn link_allowed(url: &Url, extension_blacklist: &[String]) -> bool {
    if SKIPPED_SCHEMES.contains(&url.scheme()) {
        return false;
    }
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let Some(segment) = url.path_segments().and_then(|mut s| s.next_back()) else {
        return true;
    };
    match segment.rsplit_once('.') {
        Some((_, ext)) => !extension_blacklist.iter().any(|b| b.eq_ignore_ascii_case(ext)),
        None => true,
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
