//! Retry queue routes: enqueue, sweep, cleanup, and per-user views.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::RetryRecord;
use herald_engine::queue::{EnqueueParams, RetryQueue, UserRetryStats};
use herald_engine::sweeper::{DEFAULT_CLEANUP_DAYS, RetrySweeper, SweepOutcome};

use crate::middleware::auth::ServiceAuth;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/retries", post(enqueue_retry))
        .route("/api/retries/sweep", post(run_sweep))
        .route("/api/retries/cleanup", post(run_cleanup))
        .route("/api/retries/users/{user_id}", get(list_user_retries))
        .route("/api/retries/users/{user_id}/stats", get(user_retry_stats))
}

/// POST /api/retries — Enqueue a notification for retry-capable delivery.
async fn enqueue_retry(
    State(state): State<AppState>,
    _auth: ServiceAuth,
    Json(params): Json<EnqueueParams>,
) -> Result<Json<RetryRecord>, AppError> {
    let record =
        RetryQueue::enqueue(&state.pool, &params, state.retry_config.max_attempts).await?;
    Ok(Json(record))
}

/// POST /api/retries/sweep — Run one sweep over all currently-due records.
///
/// The worker runs this on a schedule; the route exists for operators and
/// for deployments without a worker.
async fn run_sweep(
    State(state): State<AppState>,
    _auth: ServiceAuth,
) -> Result<Json<SweepOutcome>, AppError> {
    let sweeper = RetrySweeper::new(state.retry_config.clone())
        .with_record_delay(Duration::from_millis(state.config.sweep_record_delay_ms));
    let outcome = sweeper
        .process_all_pending_retries(state.transport.as_ref(), &state.pool)
        .await;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct CleanupQuery {
    days_old: Option<i64>,
}

/// POST /api/retries/cleanup — Delete terminal records past the retention window.
async fn run_cleanup(
    State(state): State<AppState>,
    _auth: ServiceAuth,
    Query(query): Query<CleanupQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let days_old = query.days_old.unwrap_or(DEFAULT_CLEANUP_DAYS);
    if days_old <= 0 {
        return Err(AppError::Validation("days_old must be positive".to_string()));
    }

    let deleted = RetrySweeper::cleanup_old_retries(&state.pool, days_old).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

/// GET /api/retries/users/:user_id — List a user's retry records, newest first.
async fn list_user_retries(
    State(state): State<AppState>,
    _auth: ServiceAuth,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<RetryRecord>>, AppError> {
    let records = RetryQueue::list_by_user(&state.pool, user_id).await?;
    Ok(Json(records))
}

/// GET /api/retries/users/:user_id/stats — Per-status record counts.
async fn user_retry_stats(
    State(state): State<AppState>,
    _auth: ServiceAuth,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserRetryStats>, AppError> {
    let stats = RetrySweeper::get_user_retry_stats(&state.pool, user_id).await?;
    Ok(Json(stats))
}
