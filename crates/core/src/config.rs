//! The fully-populated configuration the rest of the system consumes.
//!
//! File parsing and environment merging live outside this crate (and
//! outside this repo's scope); `Config` is the typed value everything
//! downstream is handed, with [`Config::default`] giving sane
//! single-node defaults so a caller that never touches a config file
//! still gets a runnable system.

use crate::job::JobKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the SQLite database file and any auxiliary state.
    pub data_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
            data_dir: "./data".into(),
        }
    }
}

impl ServerConfig {
    pub fn database_path(&self) -> String {
        format!("{}/quaero.db", self.data_dir.trim_end_matches('/'))
    }
}

/// Output format the scraper's Markdown conversion targets. `PlainText`
/// is the degraded fallback used when the page doesn't parse as HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Markdown,
    PlainText,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Markdown
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Sustained requests per second, per host.
    pub refill_per_sec: f64,
    /// Burst capacity, per host.
    pub burst: u32,
    /// Upper bound, in milliseconds, of random jitter added atop the
    /// steady request delay.
    pub random_delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            refill_per_sec: 1.0,
            burst: 2,
            random_delay_ms: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerDefaults {
    pub user_agent: String,
    /// Rotate through a pool of user-agent strings instead of a fixed one.
    pub user_agent_rotation: bool,
    pub max_concurrency: u32,
    pub request_delay_ms: u64,
    pub random_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub max_body_size_bytes: u64,
    pub max_depth: u32,
    pub follow_robots_txt: bool,
    pub output_format: OutputFormat,
    pub only_main_content: bool,
    pub include_links: bool,
    pub include_metadata: bool,
}

impl Default for CrawlerDefaults {
    fn default() -> Self {
        Self {
            user_agent: "quaero/0.1 (+https://localhost)".into(),
            user_agent_rotation: false,
            max_concurrency: 4,
            request_delay_ms: 250,
            random_delay_ms: 250,
            request_timeout_secs: 30,
            max_body_size_bytes: 10 * 1024 * 1024,
            max_depth: 2,
            follow_robots_txt: true,
            output_format: OutputFormat::Markdown,
            only_main_content: true,
            include_links: true,
            include_metadata: true,
        }
    }
}

/// A default job definition seeded at startup. Keyed by name in
/// [`Config::default_job_definitions`]; `schedule` follows standard
/// five-field cron syntax when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultJobDefinition {
    pub enabled: bool,
    pub auto_start: bool,
    pub schedule: Option<String>,
    pub description: String,
    pub kind: JobKind,
}

impl Default for DefaultJobDefinition {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_start: false,
            schedule: None,
            description: String::new(),
            kind: JobKind::Crawler,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub chat_model: String,
    pub embedding_model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11434".into(),
            chat_model: "llama3".into(),
            embedding_model: "nomic-embed-text".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub rate_limit: RateLimitConfig,
    pub crawler: CrawlerDefaults,
    pub default_job_definitions: BTreeMap<String, DefaultJobDefinition>,
    pub llm: LlmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            crawler: CrawlerDefaults::default(),
            default_job_definitions: BTreeMap::new(),
            llm: LlmConfig::default(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
