//! NDR Engine Error Types

use ndr_core::NdrError;
use thiserror::Error;

/// NDR Engine Result type
pub type EngineResult<T> = Result<T, EngineError>;

/// NDR Engine Error
#[derive(Debug, Error)]
pub enum EngineError {
    /// Domain rule rejected the operation
    #[error(transparent)]
    Core(#[from] NdrError),

    /// Messaging gateway refused or failed a send
    #[error("Messaging gateway error: {reason}")]
    Gateway { reason: String },

    /// Event sink failed to accept an event
    #[error("Event sink error: {reason}")]
    Sink { reason: String },
}

impl EngineError {
    /// Create a gateway error
    pub fn gateway(reason: impl Into<String>) -> Self {
        Self::Gateway {
            reason: reason.into(),
        }
    }

    /// Create a sink error
    pub fn sink(reason: impl Into<String>) -> Self {
        Self::Sink {
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Core(NdrError::not_found(entity, id))
    }

    /// Domain error, if this is one
    pub fn as_core(&self) -> Option<&NdrError> {
        match self {
            EngineError::Core(err) => Some(err),
            _ => None,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Gateway { .. } | EngineError::Sink { .. })
    }
}
