//! The indexed unit of knowledge: [`Document`] and its identity/merge rules.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

crate::define_id! {
    /// Opaque primary key for a document row.
    pub struct DocumentId;
}

/// Where a document was crawled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Jira,
    Confluence,
    Github,
    Generic,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Jira => "jira",
            SourceType::Confluence => "confluence",
            SourceType::Github => "github",
            SourceType::Generic => "generic",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jira" => Ok(SourceType::Jira),
            "confluence" => Ok(SourceType::Confluence),
            "github" => Ok(SourceType::Github),
            "generic" => Ok(SourceType::Generic),
            other => Err(format!("unknown source_type '{other}'")),
        }
    }
}

/// Ordinal `{minimal < basic < full}` governing how much content a crawl
/// persisted. Smart upsert refuses to downgrade a document's detail level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    Minimal,
    Basic,
    Full,
}

impl Default for DetailLevel {
    fn default() -> Self {
        DetailLevel::Basic
    }
}

impl DetailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Minimal => "minimal",
            DetailLevel::Basic => "basic",
            DetailLevel::Full => "full",
        }
    }
}

impl std::fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DetailLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimal" => Ok(DetailLevel::Minimal),
            "basic" => Ok(DetailLevel::Basic),
            "full" => Ok(DetailLevel::Full),
            other => Err(format!("unknown detail_level '{other}'")),
        }
    }
}

/// The indexed unit of knowledge.
///
/// Identity is `(source_type, source_id)`; `id` is an opaque surrogate key
/// assigned on first insert. `content_markdown` is the sole content
/// field — there is deliberately no redundant HTML column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub source_type: SourceType,
    pub source_id: String,
    pub title: String,
    pub content_markdown: String,
    pub url: String,
    pub detail_level: DetailLevel,
    /// Open key/value map: keywords, summary, word_count, parent refs, etc.
    pub metadata: Map<String, Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Apply the smart-upsert rule: an incoming document never overwrites
    /// a richer stored one with poorer content, and metadata maps merge
    /// key-by-key rather than replace wholesale (non-empty incoming
    /// values win per key).
    ///
    /// `existing` is mutated in place to become the merged result.
    pub fn smart_upsert(existing: &mut Document, incoming: Document, now: chrono::DateTime<chrono::Utc>) {
        let keep_existing_content = incoming.detail_level < existing.detail_level;

        if !keep_existing_content {
            existing.title = incoming.title;
            existing.content_markdown = incoming.content_markdown;
            existing.detail_level = incoming.detail_level;
            existing.url = incoming.url;
        }

        merge_metadata(&mut existing.metadata, incoming.metadata);
        existing.updated_at = now;
    }
}

/// Shallow merge: for each incoming key, overwrite the existing key only
/// if the incoming value is present and non-empty (a non-null, and for
/// strings/arrays/objects, non-empty value). Absent/empty incoming
/// values never erase richer existing values.
pub fn merge_metadata(existing: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        if is_meaningful(&value) {
            existing.insert(key, value);
        }
    }
}

fn is_meaningful(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
