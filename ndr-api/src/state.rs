//! Application State
//!
//! Shared state for the NDR API service.

use chrono::{DateTime, Utc};
use ndr_engine::NdrEngine;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Service name
    pub service_name: String,
    /// Service version
    pub version: String,
    /// Listen address
    pub listen_addr: String,
    /// Enable CORS
    pub enable_cors: bool,
    /// Request timeout (seconds)
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            service_name: "ndr-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            listen_addr: "0.0.0.0:3000".to_string(),
            enable_cors: true,
            request_timeout_secs: 30,
        }
    }
}

/// Application state shared across handlers
pub struct AppState {
    /// Configuration
    pub config: ApiConfig,
    /// NDR engine
    pub engine: Arc<NdrEngine>,
    /// Service start time
    pub started_at: DateTime<Utc>,
    /// Request counter
    request_counter: AtomicU64,
}

impl AppState {
    /// Create new application state with default config
    pub fn new(engine: Arc<NdrEngine>) -> Self {
        Self::with_config(ApiConfig::default(), engine)
    }

    /// Create with configuration
    pub fn with_config(config: ApiConfig, engine: Arc<NdrEngine>) -> Self {
        Self {
            config,
            engine,
            started_at: Utc::now(),
            request_counter: AtomicU64::new(0),
        }
    }

    /// Get service uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get request count
    pub fn request_count(&self) -> u64 {
        self.request_counter.load(Ordering::Relaxed)
    }
}

/// Health status of a component
///
/// The engine is in-process, so components only ever degrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
        }
    }
}

/// Component health check result
#[derive(Debug, Clone)]
pub struct ComponentHealthCheck {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
}

impl ComponentHealthCheck {
    /// Create a healthy result
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    /// Create a degraded result
    pub fn degraded(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Degraded,
            message: Some(message.into()),
        }
    }
}
