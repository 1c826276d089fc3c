use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// Kinds of push notifications the task/group app produces.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TaskReminder,
    TaskAssigned,
    TaskCompleted,
    Mention,
    NewComment,
    System,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::TaskReminder => write!(f, "task_reminder"),
            NotificationType::TaskAssigned => write!(f, "task_assigned"),
            NotificationType::TaskCompleted => write!(f, "task_completed"),
            NotificationType::Mention => write!(f, "mention"),
            NotificationType::NewComment => write!(f, "new_comment"),
            NotificationType::System => write!(f, "system"),
        }
    }
}

/// Lifecycle state of a retry record.
///
/// `Failed` and `Success` are terminal; only `Pending` and `Retrying`
/// records are eligible for sweeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RetryStatus {
    Pending,
    Retrying,
    Failed,
    Success,
}

impl std::fmt::Display for RetryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryStatus::Pending => write!(f, "pending"),
            RetryStatus::Retrying => write!(f, "retrying"),
            RetryStatus::Failed => write!(f, "failed"),
            RetryStatus::Success => write!(f, "success"),
        }
    }
}

/// Outcome class of a single delivery attempt, as recorded in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Sent,
    Delivered,
    Clicked,
    Failed,
}

impl std::fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricStatus::Sent => write!(f, "sent"),
            MetricStatus::Delivered => write!(f, "delivered"),
            MetricStatus::Clicked => write!(f, "clicked"),
            MetricStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Push message content handed to the transport.
///
/// Closed schema: `data` carries optional string key/value pairs for
/// client-side routing (e.g. task id, group id), nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
}

/// Device context attached to client-reported metrics (sent/clicked).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Classified send failure captured on retry records and failed metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A retry queue record: one notification that must eventually be delivered.
///
/// Mutated exclusively by the retry processor. `attempts <= max_attempts`
/// holds at all times (also enforced by a DB check constraint).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RetryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Caller-defined correlation id linking the record to the source event.
    pub notification_id: String,
    pub notification_type: NotificationType,
    pub payload: Json<PushPayload>,
    pub destination_token: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub status: RetryStatus,
    pub next_retry_at: DateTime<Utc>,
    pub last_error: Option<Json<ErrorDetail>>,
    pub created_at: DateTime<Utc>,
}

/// An immutable fact about one delivery attempt outcome. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Metric {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_id: String,
    pub notification_type: NotificationType,
    pub status: MetricStatus,
    pub timestamp: DateTime<Utc>,
    pub response_time_ms: Option<i64>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub destination_token: Option<String>,
    pub device_info: Option<Json<DeviceInfo>>,
}
