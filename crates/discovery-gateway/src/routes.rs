use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use cache_store::keys;
use chrono::Utc;
use discovery_core::{Classification, DiscoveryJob, DiscoveryResult, JobRecord};
use pipeline_coordinator::null_progress_sink;
use serde::{Deserialize, Serialize};

use crate::request_id::RequestId;
use crate::response::{ApiResponse, AppError};
use crate::state::AppState;

const SYNC_FALLBACK_CAP_SECONDS: u64 = 60;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/discovery/candidates", get(get_candidates))
        .route("/discovery/candidates/last", get(get_candidates_last))
        .route("/discovery/candidates/trade-ready", get(get_candidates_trade_ready))
        .route("/discovery/status", get(get_status))
        .route("/discovery/trigger", post(trigger))
        .route("/discovery/health", get(health))
        .with_state(Arc::new(state))
}

#[derive(Debug, Deserialize)]
pub struct CandidatesQuery {
    pub strategy: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub force_refresh: bool,
    /// Reserved for a future "attach to this job id instead of enqueuing" override.
    #[serde(default)]
    #[allow(dead_code)]
    pub task: Option<String>,
}

fn default_limit() -> usize {
    25
}

const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TriggerBody {
    pub strategy: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct CandidatesReady {
    pub state: &'static str,
    pub cache_hit: bool,
    pub result: DiscoveryResult,
}

#[derive(Debug, Serialize)]
pub struct CandidatesQueued {
    pub state: &'static str,
    pub job_id: String,
    pub poll_url: String,
}

fn poll_url(job_id: &str) -> String {
    format!("/discovery/status?job_id={job_id}")
}

async fn get_candidates(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Query(q): Query<CandidatesQuery>,
) -> Result<Response, AppError> {
    respond_candidates(&state, &request_id, q, None).await
}

async fn get_candidates_trade_ready(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Query(q): Query<CandidatesQuery>,
) -> Result<Response, AppError> {
    respond_candidates(&state, &request_id, q, Some(Classification::TradeReady)).await
}

async fn respond_candidates(
    state: &AppState,
    request_id: &str,
    q: CandidatesQuery,
    filter_to: Option<Classification>,
) -> Result<Response, AppError> {
    let limit = q.limit.min(MAX_LIMIT);

    if !q.force_refresh {
        let cached: Option<DiscoveryResult> = state
            .store
            .get_json(&keys::contenders(&q.strategy))
            .await
            .map_err(|e| AppError::from_kind(e.kind(), e, request_id.to_string()))?;

        if let Some(mut result) = cached {
            apply_filter_and_limit(&mut result, filter_to, limit);
            let body = ApiResponse::success(CandidatesReady { state: "ready", cache_hit: true, result }, request_id);
            return Ok((StatusCode::OK, Json(body)).into_response());
        }
    }

    let heartbeat_alive = state.store.exists(keys::HEARTBEAT).await.unwrap_or(false);

    if !heartbeat_alive {
        tracing::warn!("no live worker heartbeat, running strategy {} synchronously", q.strategy);
        return match tokio::time::timeout(
            Duration::from_secs(SYNC_FALLBACK_CAP_SECONDS),
            state.coordinator.run(&q.strategy, limit, null_progress_sink()),
        )
        .await
        {
            Ok(Ok(mut result)) => {
                apply_filter_and_limit(&mut result, filter_to, limit);
                let body = ApiResponse::success(CandidatesReady { state: "ready", cache_hit: false, result }, request_id);
                Ok((StatusCode::OK, Json(body)).into_response())
            }
            Ok(Err(e)) => Err(AppError::from_kind(e.kind(), e, request_id.to_string())),
            Err(_) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::failure("synchronous fallback exceeded its 60s cap", request_id)),
            )
                .into_response()),
        };
    }

    let job_id = enqueue_or_join_pending(state, &q.strategy, limit, request_id).await?;
    let body = ApiResponse::success(
        CandidatesQueued { state: "queued", job_id: job_id.clone(), poll_url: poll_url(&job_id) },
        request_id,
    );
    Ok((StatusCode::ACCEPTED, Json(body)).into_response())
}

fn apply_filter_and_limit(result: &mut DiscoveryResult, filter_to: Option<Classification>, limit: usize) {
    if let Some(classification) = filter_to {
        result.candidates.retain(|c| c.classification == classification);
    }
    result.candidates.truncate(limit);
}

/// Dedupes concurrent misses for the same strategy into one enqueue: the first caller
/// wins the `discovery:pending:<strategy>` slot and enqueues; later callers within the
/// job's timeout window are handed the same `job_id` instead of piling up the queue.
async fn enqueue_or_join_pending(
    state: &AppState,
    strategy: &str,
    limit: usize,
    request_id: &str,
) -> Result<String, AppError> {
    if let Some(existing) = state
        .store
        .get_json::<String>(&keys::pending(strategy))
        .await
        .map_err(|e| AppError::from_kind(e.kind(), e, request_id.to_string()))?
    {
        return Ok(existing);
    }

    let job = DiscoveryJob {
        strategy: strategy.to_string(),
        limit,
        enqueued_at: Utc::now(),
        timeout_seconds: state.config.job_timeout_seconds,
    };
    let job_id = state.queue.enqueue(job).await.map_err(|e| AppError::from_kind(e.kind(), e, request_id.to_string()))?;

    let _ = state
        .store
        .set_json(&keys::pending(strategy), &job_id, state.config.job_timeout_seconds)
        .await;

    Ok(job_id)
}

async fn get_candidates_last(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Query(q): Query<CandidatesQuery>,
) -> Json<ApiResponse<CandidatesReady>> {
    let limit = q.limit.min(MAX_LIMIT);

    let last: Option<DiscoveryResult> = state.store.get_json(&keys::contenders_last(&q.strategy)).await.unwrap_or(None);

    match last {
        Some(mut result) => {
            result.candidates.truncate(limit);
            Json(ApiResponse::success(CandidatesReady { state: "ready", cache_hit: true, result }, request_id))
        }
        None => Json(ApiResponse::success(
            CandidatesReady {
                state: "stale",
                cache_hit: false,
                result: empty_result(&q.strategy),
            },
            request_id,
        )),
    }
}

fn empty_result(strategy: &str) -> DiscoveryResult {
    let now = Utc::now();
    DiscoveryResult {
        run_id: "none".to_string(),
        started_at: now,
        finished_at: now,
        strategy_tag: strategy.to_string(),
        universe_count: 0,
        prefilter_count: 0,
        snapshot_count: 0,
        scored_count: 0,
        candidates: Vec::new(),
        stage_timings_ms: Default::default(),
        engine_version: discovery_core::ENGINE_VERSION.to_string(),
        schema_version: discovery_core::SCHEMA_VERSION,
    }
}

async fn get_status(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Query(q): Query<StatusQuery>,
) -> Result<Json<ApiResponse<JobRecord>>, AppError> {
    let record = state.queue.fetch(&q.job_id).await.map_err(|e| match e {
        job_queue::QueueError::NotFound(ref id) => {
            AppError::with_status(StatusCode::NOT_FOUND, format!("no such job: {id}"), request_id.clone())
        }
        other => AppError::from_kind(other.kind(), other, request_id.clone()),
    })?;
    Ok(Json(ApiResponse::success(record, request_id)))
}

async fn trigger(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Json(body): Json<TriggerBody>,
) -> Result<Response, AppError> {
    let limit = body.limit.min(MAX_LIMIT);
    let job = DiscoveryJob {
        strategy: body.strategy.clone(),
        limit,
        enqueued_at: Utc::now(),
        timeout_seconds: state.config.job_timeout_seconds,
    };
    let job_id = state.queue.enqueue(job).await.map_err(|e| AppError::from_kind(e.kind(), e, request_id.clone()))?;

    let _ = state
        .store
        .set_json(&keys::pending(&body.strategy), &job_id, state.config.job_timeout_seconds)
        .await;

    let body = ApiResponse::success(CandidatesQueued { state: "queued", job_id: job_id.clone(), poll_url: poll_url(&job_id) }, request_id);
    Ok((StatusCode::ACCEPTED, Json(body)).into_response())
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub store_ok: bool,
    pub heartbeat_age_seconds: Option<i64>,
    pub last_result_age_seconds: Option<i64>,
}

async fn health(State(state): State<Arc<AppState>>, Extension(RequestId(request_id)): Extension<RequestId>) -> Response {
    let store_ok = state.store.exists(keys::HEARTBEAT).await.is_ok();
    let heartbeat_age_seconds = state.store.ttl(keys::HEARTBEAT).await.ok().filter(|ttl| *ttl >= 0).map(|ttl| 120 - ttl);
    let last_result_age_seconds = most_recent_result_age(&state).await;

    let report = HealthReport { store_ok, heartbeat_age_seconds, last_result_age_seconds };
    let status = if store_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(ApiResponse::success(report, request_id))).into_response()
}

/// Scans every strategy's long-TTL payload and returns the freshest `finished_at` age,
/// since health is a liveness probe over the whole service, not one strategy.
async fn most_recent_result_age(state: &AppState) -> Option<i64> {
    let keys = state.store.keys("discovery:contenders:last:*").await.ok()?;
    let mut newest: Option<i64> = None;
    for key in keys {
        if let Ok(Some(result)) = state.store.get_json::<DiscoveryResult>(&key).await {
            let age = (Utc::now() - result.finished_at).num_seconds();
            newest = Some(newest.map_or(age, |n: i64| n.min(age)));
        }
    }
    newest
}
