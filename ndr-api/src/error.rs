//! API Error Types
//!
//! Maps domain and engine failures onto HTTP statuses with stable codes.
//! Domain errors keep their `NDR-*` code in the response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ndr_core::NdrError;
use ndr_engine::EngineError;
use serde::Serialize;
use thiserror::Error;

/// API-specific errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body or query rejected before reaching the engine
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    /// Messaging gateway failed
    #[error("Upstream gateway error: {message}")]
    BadGateway { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Domain rule rejected the request
    #[error(transparent)]
    Domain(#[from] NdrError),
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: String,
    /// Error message
    pub message: String,
    /// Optional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Domain(err) => domain_status(err),
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::BadGateway { .. } => "GATEWAY_ERROR",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
            ApiError::Domain(err) => err.code(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
        }
    }
}

fn domain_status(err: &NdrError) -> StatusCode {
    match err {
        NdrError::NotFound { .. } => StatusCode::NOT_FOUND,
        NdrError::ValidationError { .. }
        | NdrError::MissingReason
        | NdrError::SerializationError(_) => StatusCode::BAD_REQUEST,
        NdrError::ChallengeAlreadyPending { .. }
        | NdrError::ProofAlreadyClassified { .. }
        | NdrError::LedgerConflict { .. }
        | NdrError::AlreadyResolved { .. } => StatusCode::CONFLICT,
        NdrError::NotAnNdrAttempt { .. }
        | NdrError::InvalidOrderValue { .. }
        | NdrError::GenuineNotChallengeable { .. }
        | NdrError::InvalidChallengeTransition { .. }
        | NdrError::InvalidTtl { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        NdrError::Expired { .. } => StatusCode::GONE,
        NdrError::InvalidPolicy { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(err) => ApiError::Domain(err),
            EngineError::Gateway { reason } => ApiError::BadGateway { message: reason },
            EngineError::Sink { reason } => ApiError::Internal { message: reason },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        crate::metrics::record_error(self.error_code());
        if status.is_server_error() {
            tracing::warn!(code = self.error_code(), error = %self, "Request failed");
        }
        let error_response = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: None,
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = ApiError::validation("Invalid period");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_domain_errors_keep_their_codes() {
        let err = ApiError::from(NdrError::MissingReason);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "NDR-CHAL-002");

        let err = ApiError::from(NdrError::ChallengeAlreadyPending {
            ndr_id: "ndr:ORD-1:1:v1".to_string(),
            challenge_id: "challenge:ndr:ORD-1:1:v1:1".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = ApiError::from(NdrError::Expired {
            order_id: "ORD-1".to_string(),
            expired_at: "2024-01-03T12:00:00+00:00".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::GONE);

        let err = ApiError::from(NdrError::GenuineNotChallengeable {
            ndr_id: "ndr:ORD-1:1:v1".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_engine_errors() {
        let err = ApiError::from(EngineError::gateway("timeout"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err = ApiError::from(EngineError::not_found("Order", "ORD-9"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "NDR-NOT-FOUND");
    }
}
