use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use birdwatch_core::{ActionKind, JobStatus, Severity};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn internal_error<E: std::fmt::Display>(error: E) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
    #[serde(default)]
    pub name: Option<Value>,
}

/// `POST /bird` — submit a research request by name.
pub async fn post_bird(
    State(state): State<AppState>,
    Json(body): Json<SubmitBody>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<ErrorResponse>)> {
    let name = match body.name {
        Some(Value::String(name)) => name,
        _ => return Err(bad_request("'name' is required and must be a string")),
    };

    let outcome = state.queue.submit(&name).await.map_err(internal_error)?;

    let action = if outcome.is_duplicate {
        ActionKind::JobDuplicate
    } else {
        ActionKind::JobSubmitted
    };
    state
        .observer
        .log(action, Severity::Log, json!({"jobId": outcome.job.id}))
        .await
        .map_err(internal_error)?;

    let status = if outcome.is_duplicate {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(json!({
            "id": outcome.job.id,
            "name": outcome.job.name,
            "status": outcome.job.status,
            "createdAt": outcome.job.created_at,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct GetBirdQuery {
    pub name: Option<String>,
}

/// `GET /bird?name=...` — read back a completed research request.
pub async fn get_bird(
    State(state): State<AppState>,
    Query(query): Query<GetBirdQuery>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorResponse>)> {
    let name = query
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| bad_request("'name' query parameter is required"))?;

    let id = birdwatch_core::canonical_id(&name);
    let job = state.queue.get(&id).await.map_err(internal_error)?;

    match job {
        Some(job) if job.status == JobStatus::Completed => Ok(Json(json!({
            "id": job.id,
            "name": job.name,
            "status": job.status,
            "createdAt": job.created_at,
            "body": job.body,
        }))),
        _ => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "not found".to_string(),
            }),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub window: Option<i64>,
}

/// `GET /metrics?window=<ms>` — read the observer's windowed metrics.
pub async fn get_metrics(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<Value>, (StatusCode, Json<ErrorResponse>)> {
    let window_ms = query.window.unwrap_or(state.config.default_metrics_window_ms);
    let metrics = state.observer.metrics(window_ms).await.map_err(internal_error)?;

    Ok(Json(json!({
        "submitted": metrics.submitted,
        "completed": metrics.completed,
        "failed": metrics.failed,
        "failureRate": metrics.failure_rate,
        "avgProcessingTimeMs": metrics.avg_processing_time_ms,
    })))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

pub async fn readiness() -> StatusCode {
    StatusCode::OK
}
