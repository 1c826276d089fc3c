pub mod analytics;
pub mod health;
pub mod metrics;
pub mod retries;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(retries::router())
        .merge(analytics::router())
        .merge(metrics::router())
        .with_state(state)
}
