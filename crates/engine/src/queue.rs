//! Retry queue store — persistence for `retry_records`.
//!
//! Every state transition on a retry record goes through this module; the
//! processor and sweeper never touch SQL directly. Terminal records
//! (`failed`, `success`) are invisible to [`RetryQueue::list_due`] by
//! construction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::{ErrorDetail, NotificationType, PushPayload, RetryRecord};

/// Parameters for enqueueing a new retry record.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct EnqueueParams {
    pub user_id: Uuid,
    /// Caller-defined correlation id linking back to the source event.
    pub notification_id: String,
    pub notification_type: NotificationType,
    pub payload: PushPayload,
    pub destination_token: String,
    /// Overrides the configured default when set.
    pub max_attempts: Option<i32>,
}

/// Per-status record counts for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct UserRetryStats {
    pub pending: u64,
    pub retrying: u64,
    pub failed: u64,
    pub success: u64,
}

/// Service layer for retry record persistence.
pub struct RetryQueue;

impl RetryQueue {
    /// Insert a new record in `pending`, due immediately.
    pub async fn enqueue(
        pool: &PgPool,
        params: &EnqueueParams,
        default_max_attempts: i32,
    ) -> Result<RetryRecord, AppError> {
        let max_attempts = params.max_attempts.unwrap_or(default_max_attempts);
        if max_attempts <= 0 {
            return Err(AppError::Validation(
                "max_attempts must be positive".to_string(),
            ));
        }
        if params.destination_token.is_empty() {
            return Err(AppError::Validation(
                "destination_token must not be empty".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        let record: RetryRecord = sqlx::query_as(
            r#"
            INSERT INTO retry_records
                (id, user_id, notification_id, notification_type, payload,
                 destination_token, attempts, max_attempts, status, next_retry_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 0, $7, 'pending', $8, $8)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(params.user_id)
        .bind(&params.notification_id)
        .bind(params.notification_type)
        .bind(Json(&params.payload))
        .bind(&params.destination_token)
        .bind(max_attempts)
        .bind(now)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            record_id = %record.id,
            user_id = %record.user_id,
            notification_type = %record.notification_type,
            "Retry record enqueued"
        );

        Ok(record)
    }

    /// All sweepable records due at `now`, oldest due first.
    ///
    /// Only `pending` and `retrying` records qualify; `retrying` is included
    /// so records orphaned by a crash mid-send are picked up again once due.
    pub async fn list_due(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<RetryRecord>, AppError> {
        let records: Vec<RetryRecord> = sqlx::query_as(
            r#"
            SELECT * FROM retry_records
            WHERE status IN ('pending', 'retrying')
              AND next_retry_at <= $1
            ORDER BY next_retry_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Claim a record for one delivery attempt: `attempts += 1`,
    /// `status = retrying`, persisted before any send happens.
    ///
    /// Conditional update: returns `None` when the record is no longer in a
    /// sweepable status or has exhausted its attempts, so a concurrent
    /// sweeper that already finalized it cannot be double-claimed into an
    /// invalid state. Best-effort only — two sweepers can still both claim a
    /// record that has attempts left (documented at-least-once limitation).
    pub async fn mark_retrying(pool: &PgPool, id: Uuid) -> Result<Option<RetryRecord>, AppError> {
        let record: Option<RetryRecord> = sqlx::query_as(
            r#"
            UPDATE retry_records
            SET status = 'retrying', attempts = attempts + 1
            WHERE id = $1
              AND status IN ('pending', 'retrying')
              AND attempts < max_attempts
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Send failed with attempts left: back to `pending`, due at
    /// `next_retry_at`, with the classified failure recorded.
    pub async fn reschedule(
        pool: &PgPool,
        id: Uuid,
        next_retry_at: DateTime<Utc>,
        error: &ErrorDetail,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE retry_records
            SET status = 'pending', next_retry_at = $2, last_error = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(next_retry_at)
        .bind(Json(error))
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Terminal failure: attempts exhausted, record kept as an audit trail
    /// until retention cleanup.
    pub async fn mark_failed(pool: &PgPool, id: Uuid, error: &ErrorDetail) -> Result<(), AppError> {
        sqlx::query("UPDATE retry_records SET status = 'failed', last_error = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(error))
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Terminal success.
    pub async fn mark_succeeded(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE retry_records SET status = 'success' WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Delete a record. Returns true if it existed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM retry_records WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All records for a user, newest first.
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<RetryRecord>, AppError> {
        let records: Vec<RetryRecord> = sqlx::query_as(
            "SELECT * FROM retry_records WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Per-status counts for one user.
    pub async fn count_by_status_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<UserRetryStats, AppError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM retry_records WHERE user_id = $1 GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let mut stats = UserRetryStats::default();
        for (status, count) in rows {
            let count = count as u64;
            match status.as_str() {
                "pending" => stats.pending = count,
                "retrying" => stats.retrying = count,
                "failed" => stats.failed = count,
                "success" => stats.success = count,
                other => tracing::warn!(status = other, "Unknown retry status in stats query"),
            }
        }

        Ok(stats)
    }

    /// Delete terminal records created before `cutoff`. Returns the number
    /// deleted. Never touches `pending` or `retrying` records.
    pub async fn delete_terminal_older_than(
        pool: &PgPool,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM retry_records WHERE status IN ('failed', 'success') AND created_at < $1",
        )
        .bind(cutoff)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
