//! Application error types
//!
//! Process-level errors: configuration, listener setup and upstream collaborators.

use crate::config::ConfigError;
use relay_core::CoreError;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Listener errors
    #[error("Failed to bind to {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Server error: {0}")]
    Server(String),

    // Validation errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // External service errors
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream not configured: {0}")]
    UpstreamNotConfigured(&'static str),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl AppError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::InvalidInput(_) => 400,

            // 502 Bad Gateway
            Self::Upstream(_) => 502,

            // 503 Service Unavailable
            Self::UpstreamNotConfigured(_) => 503,

            // 500 Internal Server Error
            Self::Config(_) | Self::Bind { .. } | Self::Server(_) | Self::Internal(_) => 500,

            Self::Core(e) => {
                if e.is_client_error() {
                    400
                } else {
                    500
                }
            }
        }
    }

    /// Get error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Bind { .. } => "BIND_ERROR",
            Self::Server(_) => "SERVER_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::UpstreamNotConfigured(_) => "UPSTREAM_NOT_CONFIGURED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Core(e) => e.code(),
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        let status = self.status_code();
        (400..500).contains(&status)
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        let status = self.status_code();
        (500..600).contains(&status)
    }

    /// Create a bind error for a listen address
    pub fn bind(addr: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::Bind {
            addr: addr.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an upstream error
    pub fn upstream(msg: impl fmt::Display) -> Self {
        Self::Upstream(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
