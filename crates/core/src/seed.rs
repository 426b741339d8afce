//! Idempotent startup seeding of job definitions from [`Config`].
//!
//! Seeding only ever creates definitions that don't already exist by
//! name — it never overwrites one an operator has since edited through
//! the UI, so restarting the process can't silently undo a change.

use crate::config::DefaultJobDefinition;
use crate::job::{JobDefinition, JobDefinitionId};
use std::collections::BTreeMap;
use std::collections::HashSet;

/// Given the names already present in storage and the configured
/// defaults, compute the [`JobDefinition`] values that still need to be
/// created. `id_gen` supplies a fresh id per new definition.
pub fn plan_seed(
    existing_names: &HashSet<String>,
    defaults: &BTreeMap<String, DefaultJobDefinition>,
    id_gen: &impl crate::id::IdGen,
) -> Vec<JobDefinition> {
    defaults
        .iter()
        .filter(|(name, _)| !existing_names.contains(*name))
        .map(|(name, default)| JobDefinition {
            id: JobDefinitionId::generate(id_gen),
            name: name.clone(),
            kind: default.kind,
            description: default.description.clone(),
            sources: Vec::new(),
            steps: Vec::new(),
            schedule: default.schedule.clone(),
            timeout_secs: 3600,
            enabled: default.enabled,
            auto_start: default.auto_start,
            config: serde_json::Map::new(),
            pre_jobs: Vec::new(),
            post_jobs: Vec::new(),
            error_tolerance: Default::default(),
            config_error: None,
        })
        .collect()
}

#[cfg(test)]
#[path = "seed_tests.rs"]
mod tests;
