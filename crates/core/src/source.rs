//! What to crawl: [`SourceConfig`] and its validation rules.

use crate::document::SourceType;
use crate::error::InvariantError;
use serde::{Deserialize, Serialize};

crate::define_id! {
    pub struct SourceId;
}

crate::define_id! {
    pub struct AuthId;
}

/// Per-source crawl tuning. `max_depth` and `concurrency` are validated
/// at both the boundary (API) and again defensively before a crawl job
/// dispatches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
    #[serde(default)]
    pub detail_level: crate::document::DetailLevel,
    #[serde(default = "default_true")]
    pub follow_links: bool,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

fn default_max_depth() -> u32 {
    2
}
fn default_concurrency() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_request_delay_ms() -> u64 {
    250
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            concurrency: default_concurrency(),
            detail_level: crate::document::DetailLevel::Basic,
            follow_links: true,
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

impl CrawlConfig {
    pub fn validate(&self) -> Result<(), InvariantError> {
        if self.max_depth > 10 {
            return Err(InvariantError::DepthOutOfRange(self.max_depth));
        }
        if self.concurrency == 0 || self.concurrency > 10 {
            return Err(InvariantError::ConcurrencyOutOfRange(self.concurrency));
        }
        Ok(())
    }
}

/// Comma-delimited substring filters applied to the full URL of a
/// discovered link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkFilters {
    #[serde(default)]
    pub include_patterns: Vec<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl LinkFilters {
    pub fn parse(include_csv: &str, exclude_csv: &str) -> Self {
        Self {
            include_patterns: split_csv(include_csv),
            exclude_patterns: split_csv(exclude_csv),
        }
    }

    /// Empty include list passes everything; empty exclude list excludes
    /// nothing. A URL must pass both stages.
    pub fn allows(&self, url: &str) -> bool {
        let include_ok = self.include_patterns.is_empty()
            || self.include_patterns.iter().any(|p| url.contains(p.as_str()));
        let exclude_ok = !self.exclude_patterns.iter().any(|p| url.contains(p.as_str()));
        include_ok && exclude_ok
    }
}

fn split_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: SourceId,
    pub source_type: SourceType,
    pub name: String,
    pub base_url: String,
    pub enabled: bool,
    #[serde(default)]
    pub auth_id: Option<AuthId>,
    #[serde(default)]
    pub crawl_config: CrawlConfig,
    #[serde(default)]
    pub filters: LinkFilters,
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), InvariantError> {
        if self.enabled && self.base_url.trim().is_empty() {
            return Err(InvariantError::MissingBaseUrl(self.name.clone()));
        }
        self.crawl_config.validate()
    }
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
