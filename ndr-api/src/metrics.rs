//! Prometheus Metrics
//!
//! # Metrics
//!
//! ## Counters
//! - `ndr_http_requests_total` - HTTP requests by method, route, status
//! - `ndr_verdicts_total` - Classifications by verdict
//! - `ndr_errors_total` - Error responses by code
//!
//! ## Histograms
//! - `ndr_http_request_duration_seconds` - HTTP request duration
//!
//! ## Gauges
//! - `ndr_overdue_resolutions` - Expired windows not yet swept
//! - `ndr_uptime_seconds` - Service uptime
//!
//! # Configuration
//!
//! - `NDR_METRICS_ENABLED`: Enable the exporter (default: true)
//! - `NDR_METRICS_PORT`: Exporter listen port (default: 9090)

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::state::AppState;

/// Label used for requests that matched no route
const UNMATCHED_ROUTE: &str = "unmatched";

/// Metrics configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Port the Prometheus scrape endpoint listens on
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
        }
    }
}

impl MetricsConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let enabled = std::env::var("NDR_METRICS_ENABLED")
            .map(|v| parse_enabled(&v))
            .unwrap_or(true);

        let port = std::env::var("NDR_METRICS_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(9090);

        Self { enabled, port }
    }
}

fn parse_enabled(value: &str) -> bool {
    !(value.eq_ignore_ascii_case("false") || value == "0")
}

/// Install the Prometheus recorder and its scrape listener
///
/// Call once at startup. Without it every recording below is a no-op.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), String> {
    if !config.enabled {
        tracing::info!("Metrics disabled");
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install metrics recorder: {}", e))?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed HTTP request
pub fn record_request(method: &str, route: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];

    counter!("ndr_http_requests_total", &labels).increment(1);
    histogram!("ndr_http_request_duration_seconds", &labels).record(duration_secs);
}

/// Record a classification outcome
pub fn record_verdict(verdict: &str) {
    counter!("ndr_verdicts_total", "verdict" => verdict.to_string()).increment(1);
}

/// Record an error response
pub fn record_error(code: &str) {
    counter!("ndr_errors_total", "code" => code.to_string()).increment(1);
}

pub fn set_overdue_resolutions(count: usize) {
    gauge!("ndr_overdue_resolutions").set(count as f64);
}

pub fn set_uptime(seconds: u64) {
    gauge!("ndr_uptime_seconds").set(seconds as f64);
}

/// Route template for labels; raw paths carry order and challenge ids
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// Metrics middleware for tracking HTTP requests
pub async fn metrics_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = route_label(&request);

    set_uptime(state.uptime_secs());

    let response = next.run(request).await;

    record_request(
        &method,
        &route,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_metrics_config_default() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn test_parse_enabled() {
        assert!(parse_enabled("true"));
        assert!(parse_enabled("1"));
        assert!(!parse_enabled("FALSE"));
        assert!(!parse_enabled("0"));
    }

    #[test]
    fn test_disabled_metrics_skip_install() {
        let config = MetricsConfig {
            enabled: false,
            port: 0,
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_route_label_without_match() {
        let request = axum::http::Request::builder()
            .uri("/api/v1/orders/ORD-1/classify")
            .body(Body::empty())
            .unwrap();
        assert_eq!(route_label(&request), UNMATCHED_ROUTE);
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request("GET", "/api/v1/health", 200, 0.01);
        record_verdict("SUSPICIOUS");
        record_error("NDR-CHAL-001");
        set_overdue_resolutions(0);
    }
}
