//! Retry processor — drives the delivery state machine for a single record.
//!
//! One call walks a due record through one attempt:
//!
//! ```text
//! pending ──claim──▶ retrying ──send ok───▶ success (record deleted)
//!                       │
//!                       ├──send err, attempts < max──▶ pending (rescheduled)
//!                       └──send err, attempts = max──▶ failed (terminal)
//! ```
//!
//! The `retrying` transition is persisted *before* the send, so a crash
//! mid-send leaves an observable `retrying` record instead of a silently
//! lost notification.

use std::time::Instant;

use chrono::Utc;
use sqlx::PgPool;

use herald_common::push::PushTransport;
use herald_common::types::RetryRecord;

use crate::backoff::{self, RetryConfig};
use crate::metrics::MetricsRecorder;
use crate::queue::RetryQueue;

/// Per-record retry state machine.
pub struct RetryProcessor {
    config: RetryConfig,
}

impl RetryProcessor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Attempt delivery for one due record. Returns `Ok(true)` iff the
    /// notification was delivered and the record resolved.
    ///
    /// Every failure outcome emits a `failed` metric with the classified
    /// cause; success emits a `delivered` metric with the elapsed send time.
    /// Metric emission is best-effort and cannot abort this path.
    pub async fn process_retry(
        &self,
        record: &RetryRecord,
        transport: &dyn PushTransport,
        pool: &PgPool,
    ) -> anyhow::Result<bool> {
        // Claim first: attempts += 1, status = retrying, persisted before the
        // send. A record another sweeper already finalized is skipped here.
        let Some(claimed) = RetryQueue::mark_retrying(pool, record.id).await? else {
            tracing::debug!(record_id = %record.id, "Record no longer claimable, skipping");
            return Ok(false);
        };

        let started = Instant::now();
        let result = transport.send(&claimed.destination_token, &claimed.payload).await;
        let elapsed_ms = started.elapsed().as_millis() as i64;

        match result {
            Ok(()) => {
                RetryQueue::mark_succeeded(pool, claimed.id).await?;
                MetricsRecorder::record_delivered(
                    pool,
                    claimed.user_id,
                    &claimed.notification_id,
                    claimed.notification_type,
                    elapsed_ms,
                    Some(&claimed.destination_token),
                )
                .await;

                // Success retention policy: the delivered metric is the audit
                // trail, the queue entry has served its purpose.
                RetryQueue::delete(pool, claimed.id).await?;

                tracing::info!(
                    record_id = %claimed.id,
                    user_id = %claimed.user_id,
                    attempts = claimed.attempts,
                    elapsed_ms,
                    "Notification delivered"
                );

                Ok(true)
            }
            Err(err) => {
                let detail = err.detail();

                MetricsRecorder::record_failed(
                    pool,
                    claimed.user_id,
                    &claimed.notification_id,
                    claimed.notification_type,
                    &detail,
                    Some(&claimed.destination_token),
                )
                .await;

                if claimed.attempts >= claimed.max_attempts {
                    RetryQueue::mark_failed(pool, claimed.id, &detail).await?;
                    tracing::warn!(
                        record_id = %claimed.id,
                        user_id = %claimed.user_id,
                        attempts = claimed.attempts,
                        code = %detail.code,
                        "Delivery failed permanently, attempts exhausted"
                    );
                } else {
                    let next_retry_at = Utc::now() + backoff::next_delay(claimed.attempts, &self.config);
                    RetryQueue::reschedule(pool, claimed.id, next_retry_at, &detail).await?;
                    tracing::info!(
                        record_id = %claimed.id,
                        attempts = claimed.attempts,
                        code = %detail.code,
                        next_retry_at = %next_retry_at,
                        "Delivery failed, rescheduled"
                    );
                }

                Ok(false)
            }
        }
    }
}
