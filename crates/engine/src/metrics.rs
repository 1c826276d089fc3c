//! Metrics recorder — append-only delivery telemetry.
//!
//! Every entry point is best-effort: a metric that cannot be persisted is
//! logged and dropped, never surfaced to the caller. Telemetry must not be
//! able to abort the send or retry path it observes.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use herald_common::types::{DeviceInfo, ErrorDetail, MetricStatus, NotificationType};

/// One delivery-attempt outcome, ready to append.
#[derive(Debug, Clone)]
pub struct NewMetric {
    pub user_id: Uuid,
    pub notification_id: String,
    pub notification_type: NotificationType,
    pub status: MetricStatus,
    pub timestamp: DateTime<Utc>,
    pub response_time_ms: Option<i64>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub destination_token: Option<String>,
    pub device_info: Option<DeviceInfo>,
}

impl NewMetric {
    /// A metric with the given status, stamped `now`, all context unset.
    pub fn new(
        user_id: Uuid,
        notification_id: &str,
        notification_type: NotificationType,
        status: MetricStatus,
    ) -> Self {
        Self {
            user_id,
            notification_id: notification_id.to_string(),
            notification_type,
            status,
            timestamp: Utc::now(),
            response_time_ms: None,
            error_code: None,
            error_message: None,
            destination_token: None,
            device_info: None,
        }
    }
}

/// Append-only writer for `delivery_metrics`.
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Append one metric row. Persistence failure is logged, not raised.
    pub async fn record_metric(pool: &PgPool, metric: NewMetric) {
        let result = sqlx::query(
            r#"
            INSERT INTO delivery_metrics
                (id, user_id, notification_id, notification_type, status, timestamp,
                 response_time_ms, error_code, error_message, destination_token, device_info)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(metric.user_id)
        .bind(&metric.notification_id)
        .bind(metric.notification_type)
        .bind(metric.status)
        .bind(metric.timestamp)
        .bind(metric.response_time_ms)
        .bind(&metric.error_code)
        .bind(&metric.error_message)
        .bind(&metric.destination_token)
        .bind(metric.device_info.as_ref().map(Json))
        .execute(pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(
                user_id = %metric.user_id,
                notification_id = %metric.notification_id,
                status = %metric.status,
                error = %e,
                "Failed to persist delivery metric"
            );
        }
    }

    /// A notification was handed to the transport for initial (non-retry) delivery.
    pub async fn record_sent(
        pool: &PgPool,
        user_id: Uuid,
        notification_id: &str,
        notification_type: NotificationType,
        destination_token: Option<&str>,
        device_info: Option<DeviceInfo>,
    ) {
        let mut metric = NewMetric::new(user_id, notification_id, notification_type, MetricStatus::Sent);
        metric.destination_token = destination_token.map(str::to_string);
        metric.device_info = device_info;
        Self::record_metric(pool, metric).await;
    }

    /// The transport confirmed delivery, with the observed round-trip time.
    pub async fn record_delivered(
        pool: &PgPool,
        user_id: Uuid,
        notification_id: &str,
        notification_type: NotificationType,
        response_time_ms: i64,
        destination_token: Option<&str>,
    ) {
        let mut metric =
            NewMetric::new(user_id, notification_id, notification_type, MetricStatus::Delivered);
        metric.response_time_ms = Some(response_time_ms);
        metric.destination_token = destination_token.map(str::to_string);
        Self::record_metric(pool, metric).await;
    }

    /// The user interacted with a delivered notification (client-reported).
    pub async fn record_clicked(
        pool: &PgPool,
        user_id: Uuid,
        notification_id: &str,
        notification_type: NotificationType,
        device_info: Option<DeviceInfo>,
    ) {
        let mut metric =
            NewMetric::new(user_id, notification_id, notification_type, MetricStatus::Clicked);
        metric.device_info = device_info;
        Self::record_metric(pool, metric).await;
    }

    /// A delivery attempt failed, with its classified cause.
    pub async fn record_failed(
        pool: &PgPool,
        user_id: Uuid,
        notification_id: &str,
        notification_type: NotificationType,
        error: &ErrorDetail,
        destination_token: Option<&str>,
    ) {
        let mut metric = NewMetric::new(user_id, notification_id, notification_type, MetricStatus::Failed);
        metric.error_code = Some(error.code.clone());
        metric.error_message = Some(error.message.clone());
        metric.destination_token = destination_token.map(str::to_string);
        Self::record_metric(pool, metric).await;
    }
}
