//! API Routes
//!
//! Route definitions for the NDR API.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::metrics::metrics_middleware;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let enable_cors = state.config.enable_cors;
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    let mut router = Router::new()
        // Health and status
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        // Orders and NDR records
        .route("/orders", post(register_order))
        .route("/orders/:order_id/attempts", post(record_attempt))
        .route("/orders/:order_id/proof", post(submit_proof))
        .route("/orders/:order_id/classify", post(classify))
        .route("/orders/:order_id/ndr", get(get_order_ndr))
        .route("/ndr", get(list_records))
        // Challenges
        .route("/challenges", post(submit_challenge).get(list_challenges))
        .route("/challenges/:challenge_id", get(get_challenge))
        .route("/challenges/:challenge_id/evidence", post(provide_evidence))
        .route("/challenges/:challenge_id/adjudicate", post(adjudicate))
        // Customer resolution
        .route("/resolutions", post(open_resolution).get(list_resolutions))
        .route("/resolutions/resolve", post(resolve))
        .route("/resolutions/sweep", post(sweep))
        .route("/webhooks/customer-reply", post(customer_reply))
        // Reporting
        .route("/scorecard", get(scorecard))
        .route("/sellers/:seller_id/alerts", get(seller_alerts))
        .route("/sellers/:seller_id/dashboard", get(seller_dashboard))
        .with_state(state.clone());

    router = router.layer(middleware::from_fn_with_state(state, metrics_middleware));
    router = router.layer(TimeoutLayer::new(timeout));

    if enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router = router.layer(TraceLayer::new_for_http());

    router
}

/// Create a router for the V1 API with /api/v1 prefix
pub fn create_v1_router(state: Arc<AppState>) -> Router {
    Router::new().nest("/api/v1", create_router(state))
}

/// Build the full application router
pub fn build_app(state: AppState) -> Router {
    let state = Arc::new(state);

    let root_router = Router::new().route("/", get(|| async { "NDR Verification Service" }));

    let health_router = Router::new()
        .route("/healthz", get(health_check))
        .with_state(state.clone());

    root_router
        .merge(health_router)
        .merge(create_v1_router(state))
}
