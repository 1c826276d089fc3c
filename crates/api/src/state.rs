//! Shared application state for the Axum API server.

use std::sync::Arc;

use sqlx::PgPool;

use herald_common::config::AppConfig;
use herald_common::push::PushTransport;
use herald_engine::backoff::RetryConfig;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub transport: Arc<dyn PushTransport>,
    pub config: AppConfig,
    pub retry_config: RetryConfig,
}

impl AppState {
    pub fn new(pool: PgPool, transport: Arc<dyn PushTransport>, config: AppConfig) -> Self {
        let retry_config = RetryConfig::from(&config);
        Self {
            pool,
            transport,
            config,
            retry_config,
        }
    }
}
