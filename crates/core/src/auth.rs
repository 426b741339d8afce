//! Credentials for a source, captured externally by the browser extension
//! gateway and looked up by id. Immutable once captured; never embedded
//! in a job — resolved by reference at dispatch time (see
//! `quaero-storage::AuthStore::resolve`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub expiry: Option<chrono::DateTime<chrono::Utc>>,
}

/// Credential blob for one source, resolved by `auth_id` at job dispatch
/// and copied into the job's in-memory context so a mid-crawl credential
/// rotation never mutates in-flight requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSnapshot {
    pub id: crate::source::AuthId,
    pub cookies: Vec<Cookie>,
    /// Free-form bearer-style tokens: `atl_token`, `cloud_id`, etc.
    pub tokens: HashMap<String, String>,
    pub base_url: String,
    pub user_agent: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl AuthSnapshot {
    /// Cookie header value for an HTTP request to the given host.
    pub fn cookie_header(&self, host: &str) -> String {
        self.cookies
            .iter()
            .filter(|c| host.ends_with(c.domain.trim_start_matches('.')))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
