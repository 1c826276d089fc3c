//! Delivery analytics routes.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use herald_common::error::AppError;
use herald_engine::analytics::{AnalyticsAggregator, AnalyticsSnapshot, DEFAULT_WINDOW_DAYS};
use herald_engine::thresholds::{ThresholdReport, check_performance_thresholds};

use crate::middleware::auth::ServiceAuth;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/analytics/users/{user_id}", get(user_analytics))
        .route("/api/analytics/system", get(system_analytics))
        .route("/api/analytics/system/health", get(system_health))
}

#[derive(Debug, Deserialize)]
struct WindowQuery {
    days: Option<i64>,
}

fn window_days(query: &WindowQuery) -> Result<i64, AppError> {
    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    if days <= 0 {
        return Err(AppError::Validation("days must be positive".to_string()));
    }
    Ok(days)
}

/// GET /api/analytics/users/:user_id — Delivery snapshot for one user.
async fn user_analytics(
    State(state): State<AppState>,
    _auth: ServiceAuth,
    Path(user_id): Path<Uuid>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<AnalyticsSnapshot>, AppError> {
    let days = window_days(&query)?;
    let snapshot = AnalyticsAggregator::get_user_analytics(&state.pool, user_id, days).await;
    Ok(Json(snapshot))
}

/// GET /api/analytics/system — System-wide delivery snapshot.
async fn system_analytics(
    State(state): State<AppState>,
    _auth: ServiceAuth,
    Query(query): Query<WindowQuery>,
) -> Result<Json<AnalyticsSnapshot>, AppError> {
    let days = window_days(&query)?;
    let snapshot = AnalyticsAggregator::get_system_analytics(&state.pool, days).await;
    Ok(Json(snapshot))
}

/// System snapshot plus its threshold classification.
#[derive(Debug, Serialize)]
struct SystemHealth {
    snapshot: AnalyticsSnapshot,
    thresholds: ThresholdReport,
}

/// GET /api/analytics/system/health — Snapshot with warning/critical signals.
async fn system_health(
    State(state): State<AppState>,
    _auth: ServiceAuth,
    Query(query): Query<WindowQuery>,
) -> Result<Json<SystemHealth>, AppError> {
    let days = window_days(&query)?;
    let snapshot = AnalyticsAggregator::get_system_analytics(&state.pool, days).await;
    let thresholds = check_performance_thresholds(&snapshot);
    Ok(Json(SystemHealth {
        snapshot,
        thresholds,
    }))
}
