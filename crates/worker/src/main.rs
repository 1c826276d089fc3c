//! Herald sweep worker binary entrypoint.

use std::sync::Arc;
use std::time::Duration;

use herald_common::config::AppConfig;
use herald_common::db;
use herald_common::push::PushTransport;
use herald_common::redis_pool;
use herald_engine::backoff::RetryConfig;
use herald_transport::HttpPushTransport;
use herald_worker::scheduler::SweepScheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald_worker=info,herald_engine=info".into()),
        )
        .json()
        .init();

    tracing::info!("Herald worker starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Redis backs the sweep lease; without it the worker sweeps leaseless,
    // which is fine for a single-instance deployment.
    let redis = match redis_pool::create_redis_pool(&config.redis_url).await {
        Ok(conn) => Some(conn),
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, sweeping without a lease");
            None
        }
    };

    let transport: Arc<dyn PushTransport> = Arc::new(HttpPushTransport::from_config(&config)?);

    let mut scheduler = SweepScheduler::new(
        pool,
        redis,
        transport,
        RetryConfig::from(&config),
        Duration::from_millis(config.sweep_record_delay_ms),
    );

    scheduler.spawn_sweep(Duration::from_secs(config.sweep_interval_secs));
    scheduler.spawn_cleanup(
        Duration::from_secs(config.cleanup_interval_secs),
        config.cleanup_days_old,
    );

    tracing::info!(
        sweep_interval_secs = config.sweep_interval_secs,
        cleanup_interval_secs = config.cleanup_interval_secs,
        "Herald worker running"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal, stopping gracefully...");
    scheduler.shutdown();

    tracing::info!("Herald worker stopped.");
    Ok(())
}
