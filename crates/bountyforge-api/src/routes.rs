//! HTTP routes: one `Router<AppState>` assembled from small handler
//! functions.
//!
//! This driver implements only the interface surface needed to invoke
//! the engine; there is no login/session handling here — the principal
//! is an opaque `X-Principal` header value.

use std::collections::HashMap;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use bountyforge_core::bus::{job_channel, EventBus};
use bountyforge_core::id::ResourceId;
use bountyforge_core::job::{JobDescriptor, JobRecord, JobStatus, StageOverrides};
use bountyforge_core::stage::StageName;
use bountyforge_core::store::ResultStore;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/scans", post(submit_scan).get(list_scans))
        .route("/scans/{job_id}", get(get_scan))
        .route("/scans/{job_id}/events", get(stream_scan_events))
        .route("/adapters", get(list_adapters))
        .with_state(state)
}

const PRINCIPAL_HEADER: &str = "x-principal";

fn require_principal(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(PRINCIPAL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing {PRINCIPAL_HEADER} header")))
}

/// Body shape for `POST /scans`: a `JobDescriptor` minus the
/// `job-id`/`initiator` fields, which this layer assigns.
#[derive(Debug, Deserialize)]
pub struct SubmitScanRequest {
    pub target: Vec<String>,
    pub tools: Vec<StageName>,
    #[serde(default)]
    pub params: HashMap<StageName, StageOverrides>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub abort_on_error: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitScanResponse {
    pub job_id: ResourceId,
}

async fn submit_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SubmitScanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let initiator = require_principal(&headers)?;

    if request.target.is_empty() {
        return Err(ApiError::BadRequest("target must not be empty".to_string()));
    }
    if request.tools.is_empty() {
        return Err(ApiError::BadRequest("tools must not be empty".to_string()));
    }

    let descriptor = JobDescriptor {
        target: request.target,
        tools: request.tools,
        params: request.params,
        initiator,
        exclude: request.exclude,
        abort_on_error: request.abort_on_error,
    };

    let job_id = ResourceId::new();
    state.store.enqueue_job(job_id, &descriptor).await?;
    state
        .queue
        .push(job_id, &descriptor)
        .await
        .map_err(bountyforge_core::Error::from)?;

    Ok((axum::http::StatusCode::ACCEPTED, Json(SubmitScanResponse { job_id })))
}

#[derive(Debug, Deserialize)]
pub struct ListScansQuery {
    pub principal: String,
    pub since: Option<DateTime<Utc>>,
}

async fn list_scans(
    State(state): State<AppState>,
    Query(query): Query<ListScansQuery>,
) -> Result<Json<Vec<JobSummary>>, ApiError> {
    let jobs = state
        .store
        .list_jobs_by_principal(&query.principal, query.since)
        .await?;
    Ok(Json(jobs.iter().map(JobSummary::from).collect()))
}

/// Job history/detail view: per-stage success flags and, when
/// unsuccessful, the captured error text and exit code.
#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub job_id: ResourceId,
    pub initiator: String,
    pub targets: Vec<String>,
    pub enqueued_at: DateTime<Utc>,
    pub status: JobStatus,
    pub result_count: usize,
    pub stages: Vec<StageSummary>,
}

#[derive(Debug, Serialize)]
pub struct StageSummary {
    pub stage: StageName,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
    pub record_count: usize,
}

impl From<&JobRecord> for JobSummary {
    fn from(record: &JobRecord) -> Self {
        let mut stages: Vec<StageSummary> = record
            .results
            .iter()
            .map(|(stage, result)| StageSummary {
                stage: *stage,
                success: result.success,
                exit_code: result.exit_code,
                error: result.error.clone(),
                record_count: result.parsed.len(),
            })
            .collect();
        stages.sort_by_key(|s| {
            StageName::CANONICAL_ORDER
                .iter()
                .position(|c| *c == s.stage)
                .unwrap_or(usize::MAX)
        });

        Self {
            job_id: record.job_id,
            initiator: record.initiator.clone(),
            targets: record.targets.clone(),
            enqueued_at: record.enqueued_at,
            status: record.status.clone(),
            result_count: record.result_count(),
            stages,
        }
    }
}

async fn get_scan(
    State(state): State<AppState>,
    Path(job_id): Path<ResourceId>,
) -> Result<Json<JobSummary>, ApiError> {
    let record = state.store.find_job(job_id).await?;
    Ok(Json(JobSummary::from(&record)))
}

/// Server-sent-event stream over a job's channel. Ends once the bus
/// observes a terminal event for this job; until then each message is
/// the event's JSON form on one SSE `data:` line.
async fn stream_scan_events(
    State(state): State<AppState>,
    Path(job_id): Path<ResourceId>,
) -> Sse<impl Stream<Item = Result<SseEvent, std::convert::Infallible>>> {
    let channel = job_channel(job_id);
    let events = state.bus.subscribe(&channel).await;

    let stream = events.map(|event| {
        let kind = serde_json::to_value(event.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "event".to_string());
        Ok(SseEvent::default()
            .event(kind)
            .json_data(event)
            .unwrap_or_else(|_| SseEvent::default().data("serialization error")))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn list_adapters(State(state): State<AppState>) -> Json<serde_json::Value> {
    let availability = state.registry.check_availability().await;
    Json(serde_json::json!({ "adapters": availability }))
}
