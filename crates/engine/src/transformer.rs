//! Parses a scraped page into a [`Document`], given the originating
//! job's source context. Deliberately "dumb" — no source-specific
//! parsers live here; domain enrichment (keywords, summaries) is the
//! summariser executor's job (§4.10 of the design).

use quaero_adapters::ScrapeResult;
use quaero_core::{Document, DocumentId, IdGen, SourceConfig};
use serde_json::{Map, Value};

/// Fields the source-id heuristic looks for in embedded JSON-LD, in
/// priority order.
const SOURCE_ID_FIELDS: &[&str] = &["id", "key", "number"];

/// Turn one scraped page into a document row, ready for
/// [`quaero_storage::DocumentStore::upsert`]. The caller supplies a
/// fresh id — the store discards it in favour of the existing row's id
/// when `(source_type, source_id)` already exists.
pub fn transform(
    result: &ScrapeResult,
    url: &str,
    source: &SourceConfig,
    id_gen: &dyn IdGen,
    now: chrono::DateTime<chrono::Utc>,
) -> Document {
    let title = if result.title.trim().is_empty() {
        first_heading_fallback(url)
    } else {
        result.title.clone()
    };

    Document {
        id: DocumentId::generate(id_gen),
        source_type: source.source_type,
        source_id: derive_source_id(result, url),
        title,
        content_markdown: result.markdown.clone(),
        url: url.to_string(),
        detail_level: source.crawl_config.detail_level,
        metadata: build_metadata(result, url),
        created_at: now,
        updated_at: now,
    }
}

/// `(a)` a JSON-LD body field matching `id`/`key`/`number`; `(b)` the
/// last non-empty path segment of the URL.
fn derive_source_id(result: &ScrapeResult, url: &str) -> String {
    for candidate in &result.metadata.json_ld {
        for field in SOURCE_ID_FIELDS {
            if let Some(value) = candidate.get(*field) {
                if let Some(id) = value_as_source_id(value) {
                    return id;
                }
            }
        }
    }
    last_path_segment(url).unwrap_or_else(|| url.to_string())
}

fn value_as_source_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Degraded title fallback when the scraper found neither a `<title>`
/// nor an `<h1>` — the URL's last path segment, or the whole URL.
fn first_heading_fallback(url: &str) -> String {
    last_path_segment(url).unwrap_or_else(|| url.to_string())
}

/// `url`, `links`, `language`, and the Open Graph subset — the small,
/// well-known metadata set the spec names, plus nothing else. Domain
/// hints the crawler context wants to inject (e.g. a parent job id) are
/// merged in by the caller before the document reaches storage.
fn build_metadata(result: &ScrapeResult, url: &str) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("url".to_string(), Value::String(url.to_string()));
    metadata.insert(
        "links".to_string(),
        Value::Array(result.links.iter().cloned().map(Value::String).collect()),
    );
    if let Some(language) = &result.language {
        metadata.insert("language".to_string(), Value::String(language.clone()));
    }
    if !result.metadata.open_graph.is_empty() {
        let og = result
            .metadata
            .open_graph
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        metadata.insert("open_graph".to_string(), Value::Object(og));
    }
    if let Some(description) = &result.description {
        metadata.insert("description".to_string(), Value::String(description.clone()));
    }
    metadata
}

#[cfg(test)]
#[path = "transformer_tests.rs"]
mod tests;
