//! Client-reported metric events.
//!
//! The app backend reports `sent` when it hands a notification to the
//! transport outside the retry path, and clients report `clicked` when the
//! user opens one. `delivered` and `failed` are engine-recorded only and
//! rejected here.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::{DeviceInfo, MetricStatus, NotificationType};
use herald_engine::metrics::MetricsRecorder;

use crate::middleware::auth::ServiceAuth;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/metrics", post(report_metric))
}

#[derive(Debug, Deserialize)]
struct ReportMetricParams {
    user_id: Uuid,
    notification_id: String,
    notification_type: NotificationType,
    status: MetricStatus,
    destination_token: Option<String>,
    device_info: Option<DeviceInfo>,
}

/// POST /api/metrics — Record a sent or clicked event.
async fn report_metric(
    State(state): State<AppState>,
    _auth: ServiceAuth,
    Json(params): Json<ReportMetricParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    match params.status {
        MetricStatus::Sent => {
            MetricsRecorder::record_sent(
                &state.pool,
                params.user_id,
                &params.notification_id,
                params.notification_type,
                params.destination_token.as_deref(),
                params.device_info,
            )
            .await;
        }
        MetricStatus::Clicked => {
            MetricsRecorder::record_clicked(
                &state.pool,
                params.user_id,
                &params.notification_id,
                params.notification_type,
                params.device_info,
            )
            .await;
        }
        MetricStatus::Delivered | MetricStatus::Failed => {
            return Err(AppError::Validation(format!(
                "Metric status '{}' is recorded by the delivery engine, not callers",
                params.status
            )));
        }
    }

    Ok(Json(serde_json::json!({ "recorded": true })))
}
