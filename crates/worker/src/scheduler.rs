//! Sweep scheduler — owns the periodic jobs that drive the engine.
//!
//! The engine itself has no timers; this scheduler holds an explicit job
//! table (name → task handle) where each job loops on a `tokio::time`
//! interval. Jobs are started and stopped through method calls with the
//! clockwork fully owned by this struct, so tests can drive the engine
//! directly without any timer, and nothing hides in process-global state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use herald_common::push::PushTransport;
use herald_engine::backoff::RetryConfig;
use herald_engine::sweeper::RetrySweeper;

use crate::lease::SweepLease;

/// Periodic driver for retry sweeps and retention cleanup.
pub struct SweepScheduler {
    pool: PgPool,
    /// Lease backend; `None` runs leaseless (single-instance deployment).
    redis: Option<ConnectionManager>,
    transport: Arc<dyn PushTransport>,
    retry_config: RetryConfig,
    record_delay: Duration,
    jobs: HashMap<String, JoinHandle<()>>,
}

impl SweepScheduler {
    pub fn new(
        pool: PgPool,
        redis: Option<ConnectionManager>,
        transport: Arc<dyn PushTransport>,
        retry_config: RetryConfig,
        record_delay: Duration,
    ) -> Self {
        Self {
            pool,
            redis,
            transport,
            retry_config,
            record_delay,
            jobs: HashMap::new(),
        }
    }

    /// Start the periodic retry sweep job. Replaces a previous sweep job.
    pub fn spawn_sweep(&mut self, interval: Duration) {
        let pool = self.pool.clone();
        let mut redis = self.redis.clone();
        let transport = Arc::clone(&self.transport);
        let sweeper =
            RetrySweeper::new(self.retry_config.clone()).with_record_delay(self.record_delay);
        // Lease expires one second before the next tick so a healthy worker
        // re-acquires its own lease every period.
        let lease = SweepLease::new(interval.as_secs().saturating_sub(1));
        let owner = Uuid::new_v4().to_string();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;

                if let Some(conn) = redis.as_mut()
                    && !lease.try_acquire(conn, &owner).await
                {
                    continue;
                }

                let outcome = sweeper
                    .process_all_pending_retries(transport.as_ref(), &pool)
                    .await;
                if outcome.processed > 0 {
                    tracing::info!(
                        processed = outcome.processed,
                        successful = outcome.successful,
                        failed = outcome.failed,
                        "Scheduled sweep completed"
                    );
                }
            }
        });

        self.insert_job("sweep", handle);
    }

    /// Start the periodic retention cleanup job. Replaces a previous one.
    pub fn spawn_cleanup(&mut self, interval: Duration, days_old: i64) {
        let pool = self.pool.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = RetrySweeper::cleanup_old_retries(&pool, days_old).await {
                    tracing::error!(error = %e, "Retention cleanup failed");
                }
            }
        });

        self.insert_job("cleanup", handle);
    }

    /// Stop one job by name. Returns true if it was running.
    pub fn stop(&mut self, name: &str) -> bool {
        if let Some(handle) = self.jobs.remove(name) {
            handle.abort();
            tracing::info!(job = name, "Scheduler job stopped");
            true
        } else {
            false
        }
    }

    /// Names of currently registered jobs, sorted.
    pub fn running_jobs(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.keys().cloned().collect();
        names.sort();
        names
    }

    /// Abort every job.
    pub fn shutdown(&mut self) {
        for (name, handle) in self.jobs.drain() {
            handle.abort();
            tracing::info!(job = %name, "Scheduler job stopped");
        }
    }

    fn insert_job(&mut self, name: &str, handle: JoinHandle<()>) {
        if let Some(previous) = self.jobs.insert(name.to_string(), handle) {
            previous.abort();
        }
        tracing::info!(job = name, "Scheduler job started");
    }
}

impl Drop for SweepScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use herald_common::push::SendError;
    use herald_common::types::PushPayload;

    struct NoopTransport;

    #[async_trait]
    impl PushTransport for NoopTransport {
        async fn send(&self, _token: &str, _payload: &PushPayload) -> Result<(), SendError> {
            Ok(())
        }
    }

    fn test_scheduler() -> SweepScheduler {
        // Lazy pool: no connection is made until a job actually queries,
        // and sweep reads are fail-open, so no database is needed here.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost:5432/herald_test")
            .unwrap();
        SweepScheduler::new(
            pool,
            None,
            Arc::new(NoopTransport),
            RetryConfig::default(),
            Duration::from_millis(100),
        )
    }

    #[tokio::test]
    async fn test_job_table_tracks_spawned_jobs() {
        let mut scheduler = test_scheduler();
        assert!(scheduler.running_jobs().is_empty());

        scheduler.spawn_sweep(Duration::from_secs(3600));
        scheduler.spawn_cleanup(Duration::from_secs(3600), 7);
        assert_eq!(scheduler.running_jobs(), vec!["cleanup", "sweep"]);
    }

    #[tokio::test]
    async fn test_stop_removes_named_job() {
        let mut scheduler = test_scheduler();
        scheduler.spawn_sweep(Duration::from_secs(3600));

        assert!(scheduler.stop("sweep"));
        assert!(scheduler.running_jobs().is_empty());
        assert!(!scheduler.stop("sweep"), "stopping twice is a no-op");
    }

    #[tokio::test]
    async fn test_respawn_replaces_previous_job() {
        let mut scheduler = test_scheduler();
        scheduler.spawn_sweep(Duration::from_secs(3600));
        scheduler.spawn_sweep(Duration::from_secs(3600));
        assert_eq!(scheduler.running_jobs(), vec!["sweep"]);
    }

    #[tokio::test]
    async fn test_shutdown_clears_all_jobs() {
        let mut scheduler = test_scheduler();
        scheduler.spawn_sweep(Duration::from_secs(3600));
        scheduler.spawn_cleanup(Duration::from_secs(3600), 7);

        scheduler.shutdown();
        assert!(scheduler.running_jobs().is_empty());
    }
}
