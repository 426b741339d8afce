//! On-demand job creation and inspection. `POST /api/jobs` accepts
//! either `{definition_id}` (runs a registered definition right away,
//! fanning out over its sources exactly like a scheduled tick) or
//! `{source_id, type}` (a one-off crawl of a single source with no
//! definition behind it).

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::Json;
use quaero_core::{Job, JobDefinitionId, JobId, JobKind, JobStatus, SourceId};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    status: Option<String>,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn list(State(state): State<AppState>, Query(query): Query<JobListQuery>) -> Result<Json<Vec<Job>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| s.parse::<JobStatus>().map_err(ApiError::Invalid))
        .transpose()?;
    Ok(Json(state.storage.jobs.list_paginated(status, query.limit, query.offset)?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Job>> {
    Ok(Json(state.storage.jobs.get(&JobId::new(id))?))
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    definition_id: Option<String>,
    source_id: Option<String>,
    #[serde(rename = "type")]
    job_type: Option<String>,
}

#[derive(Serialize)]
pub struct CreateJobResponse {
    jobs: Vec<Job>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<Json<CreateJobResponse>> {
    if let Some(definition_id) = request.definition_id {
        let def = state.storage.job_definitions.get(&JobDefinitionId::new(definition_id))?;
        let jobs = state.scheduler.dispatch_on_demand(&def)?;
        return Ok(Json(CreateJobResponse { jobs }));
    }

    let (Some(source_id), Some(job_type)) = (request.source_id, request.job_type) else {
        return Err(ApiError::Invalid(
            "request body must provide either definition_id or source_id + type".to_string(),
        ));
    };
    if job_type.parse::<JobKind>().map_err(|err| ApiError::Invalid(err.to_string()))? != JobKind::Crawler {
        return Err(ApiError::Invalid("ad-hoc jobs only support type \"crawler\"".to_string()));
    }

    let timeout = Duration::from_secs(3600);
    let job = state
        .scheduler
        .dispatch_ad_hoc_source(&SourceId::new(source_id), timeout)?;
    Ok(Json(CreateJobResponse { jobs: vec![job] }))
}

pub async fn cancel(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<()>> {
    state.dispatcher.cancel(&JobId::new(id));
    Ok(Json(()))
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
