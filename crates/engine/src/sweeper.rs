//! Retry sweeper — one bounded batch pass over all currently-due records.
//!
//! Records are processed sequentially with a fixed pause between them to
//! bound burst load on the push channel. A failure while processing one
//! record is contained to that record; the sweep always runs to completion
//! over the rest.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::push::PushTransport;

use crate::backoff::RetryConfig;
use crate::processor::RetryProcessor;
use crate::queue::{RetryQueue, UserRetryStats};

/// Default pause between records within one sweep.
const DEFAULT_RECORD_DELAY_MS: u64 = 100;

/// Default retention window for terminal records, in days.
pub const DEFAULT_CLEANUP_DAYS: i64 = 7;

/// Aggregate result of one sweep. `processed == successful + failed` always.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepOutcome {
    pub processed: u64,
    pub successful: u64,
    pub failed: u64,
}

/// Batch driver over the retry queue.
pub struct RetrySweeper {
    processor: RetryProcessor,
    record_delay: Duration,
}

impl RetrySweeper {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            processor: RetryProcessor::new(config),
            record_delay: Duration::from_millis(DEFAULT_RECORD_DELAY_MS),
        }
    }

    /// Override the inter-record pause (`AppConfig::sweep_record_delay_ms`).
    pub fn with_record_delay(mut self, delay: Duration) -> Self {
        self.record_delay = delay;
        self
    }

    /// Process every record due right now, sequentially.
    ///
    /// The due-list read is fail-open: if the store query errors, the sweep
    /// is skipped (empty outcome) and retried by the next scheduled run.
    pub async fn process_all_pending_retries(
        &self,
        transport: &dyn PushTransport,
        pool: &PgPool,
    ) -> SweepOutcome {
        let due = match RetryQueue::list_due(pool, Utc::now()).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list due retry records, skipping sweep");
                return SweepOutcome::default();
            }
        };

        if due.is_empty() {
            return SweepOutcome::default();
        }

        tracing::info!(due = due.len(), "Retry sweep started");

        let mut outcome = SweepOutcome::default();
        for (i, record) in due.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.record_delay).await;
            }

            match self.processor.process_retry(record, transport, pool).await {
                Ok(true) => outcome.successful += 1,
                Ok(false) => outcome.failed += 1,
                Err(e) => {
                    // Contained: the record stays in whatever state it
                    // reached and will surface on a later sweep.
                    tracing::error!(
                        record_id = %record.id,
                        error = %e,
                        "Retry processing aborted mid-record"
                    );
                    outcome.failed += 1;
                }
            }
            outcome.processed += 1;
        }

        tracing::info!(
            processed = outcome.processed,
            successful = outcome.successful,
            failed = outcome.failed,
            "Retry sweep finished"
        );

        outcome
    }

    /// Delete terminal (`failed`/`success`) records older than `days_old`
    /// days. `pending` and `retrying` records are never touched, regardless
    /// of age. Returns the number of rows deleted.
    pub async fn cleanup_old_retries(pool: &PgPool, days_old: i64) -> Result<u64, AppError> {
        let cutoff = Utc::now() - ChronoDuration::days(days_old);
        let deleted = RetryQueue::delete_terminal_older_than(pool, cutoff).await?;

        if deleted > 0 {
            tracing::info!(deleted, days_old, "Cleaned up old retry records");
        }

        Ok(deleted)
    }

    /// Per-status record counts for one user.
    pub async fn get_user_retry_stats(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<UserRetryStats, AppError> {
        RetryQueue::count_by_status_for_user(pool, user_id).await
    }
}
