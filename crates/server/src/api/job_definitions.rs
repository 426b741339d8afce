//! CRUD on job definitions. A definition with an unparseable schedule
//! isn't rejected outright — per the configuration-error handling
//! design, it is stored disabled with `config_error` set so the UI can
//! surface and fix it, rather than losing the submitted definition.

use axum::extract::{Path, State};
use axum::Json;
use quaero_core::{JobDefinition, JobDefinitionId};

use crate::error::Result;
use crate::state::AppState;

fn apply_schedule_check(state: &AppState, mut def: JobDefinition) -> JobDefinition {
    if let Some(schedule) = def.schedule.clone() {
        if let Err(err) = state.scheduler.validate_schedule(&schedule) {
            def.enabled = false;
            def.config_error = Some(err.to_string());
        } else {
            def.config_error = None;
        }
    }
    def
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<JobDefinition>>> {
    Ok(Json(state.storage.job_definitions.list()?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<JobDefinition>> {
    Ok(Json(state.storage.job_definitions.get(&JobDefinitionId::new(id))?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(def): Json<JobDefinition>,
) -> Result<Json<JobDefinition>> {
    let def = apply_schedule_check(&state, def);
    Ok(Json(state.storage.job_definitions.create(def)?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut def): Json<JobDefinition>,
) -> Result<Json<JobDefinition>> {
    def.id = JobDefinitionId::new(id);
    let def = apply_schedule_check(&state, def);
    Ok(Json(state.storage.job_definitions.update(def)?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<()>> {
    state.storage.job_definitions.delete(&JobDefinitionId::new(id))?;
    Ok(Json(()))
}

#[cfg(test)]
#[path = "job_definitions_tests.rs"]
mod tests;
