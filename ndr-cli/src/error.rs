//! CLI Error Types
//!
//! Error types for the NDR CLI application.

use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Domain rule rejected the input
    #[error("{0}")]
    CoreError(#[from] ndr_core::NdrError),

    /// Engine error
    #[error("Engine error: {0}")]
    EngineError(#[from] ndr_engine::EngineError),

    /// Server error
    #[error("Server error: {message}")]
    ServerError { message: String },
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        CliError::ConfigError {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_arg(message: impl Into<String>) -> Self {
        CliError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a server error
    pub fn server(message: impl Into<String>) -> Self {
        CliError::ServerError {
            message: message.into(),
        }
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ConfigError { .. } => 1,
            CliError::InvalidArgument { .. } => 2,
            CliError::IoError(_) => 5,
            CliError::JsonError(_) => 6,
            CliError::CoreError(_) => 12,
            CliError::EngineError(_) => 13,
            CliError::ServerError { .. } => 30,
        }
    }
}
