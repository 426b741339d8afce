//! Composite entry point: builds the connection pool once and hands out
//! typed sub-stores that all share it.

use crate::auth_store::AuthStore;
use crate::document_store::DocumentStore;
use crate::error::Result;
use crate::job_definition_store::JobDefinitionStore;
use crate::job_store::JobStore;
use crate::maintenance::MaintenanceStore;
use crate::pool::{build_pool, Pool};
use crate::source_store::SourceStore;
use quaero_core::{plan_seed, Clock, DefaultJobDefinition, IdGen};
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct StorageManager {
    pool: Pool,
    pub documents: DocumentStore,
    pub jobs: JobStore,
    pub job_definitions: JobDefinitionStore,
    pub sources: SourceStore,
    pub auth: AuthStore,
    pub maintenance: MaintenanceStore,
}

impl StorageManager {
    pub fn open(database_path: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        let pool = build_pool(database_path)?;
        Ok(Self {
            documents: DocumentStore::new(pool.clone(), clock.clone()),
            jobs: JobStore::new(pool.clone(), clock.clone()),
            job_definitions: JobDefinitionStore::new(pool.clone()),
            sources: SourceStore::new(pool.clone(), clock.clone()),
            auth: AuthStore::new(pool.clone(), clock),
            maintenance: MaintenanceStore::new(pool.clone()),
            pool,
        })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Idempotently create any TOML-configured job definitions that
    /// don't already exist by name. Safe to call on every startup.
    pub fn seed_job_definitions(
        &self,
        defaults: &BTreeMap<String, DefaultJobDefinition>,
        id_gen: &impl IdGen,
    ) -> Result<usize> {
        let existing = self.job_definitions.existing_names()?;
        let plan = plan_seed(&existing, defaults, id_gen);
        let count = plan.len();
        for def in plan {
            self.job_definitions.create(def)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
