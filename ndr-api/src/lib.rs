//! NDR API - HTTP Interface Layer
//!
//! HTTP surface over the NDR engine.
//!
//! # Endpoints
//!
//! All routes below are nested under `/api/v1`; `/healthz` is also served at
//! the root.
//!
//! ## Health & Status
//! - `GET /health` - Service health check
//! - `GET /stats` - Engine statistics
//!
//! ## Orders
//! - `POST /orders` - Register an order
//! - `POST /orders/:order_id/attempts` - Record a courier event
//! - `POST /orders/:order_id/proof` - Attach proof to the latest NDR attempt
//! - `POST /orders/:order_id/classify` - Classify the latest NDR attempt
//! - `GET /orders/:order_id/ndr` - Record versions of an order
//! - `GET /ndr` - Current records (`seller_id`, `period`, `from`, `to`)
//!
//! ## Challenges
//! - `POST /challenges` / `GET /challenges`
//! - `GET /challenges/:id`
//! - `POST /challenges/:id/evidence`
//! - `POST /challenges/:id/adjudicate`
//!
//! ## Customer Resolution
//! - `POST /resolutions` - Notify the customer and open a window
//! - `GET /resolutions` - List windows, optionally `?status=pending|resolved|escalated`
//! - `POST /resolutions/resolve` - Record an explicit choice
//! - `POST /resolutions/sweep` - Escalate expired windows
//! - `POST /webhooks/customer-reply` - Inbound free-text reply
//!
//! ## Reporting
//! - `GET /scorecard`
//! - `GET /sellers/:seller_id/alerts`
//! - `GET /sellers/:seller_id/dashboard`
//!
//! # Usage Example
//!
//! ```ignore
//! use ndr_api::{build_app, ApiConfig, AppState};
//! use ndr_engine::NdrEngine;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = Arc::new(NdrEngine::default_policy().unwrap());
//!     let state = AppState::with_config(ApiConfig::default(), engine);
//!     let app = build_app(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

// Re-export main types
pub use dto::*;
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use metrics::{init_metrics, MetricsConfig};
pub use routes::{build_app, create_router, create_v1_router};
pub use state::{ApiConfig, AppState, ComponentHealthCheck, HealthStatus};

/// NDR API version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default API port
pub const DEFAULT_PORT: u16 = 3000;

/// Start the API server
pub async fn start_server(state: AppState) -> Result<(), std::io::Error> {
    let addr = state.config.listen_addr.clone();
    let app = build_app(state);

    tracing::info!("Starting NDR API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}
