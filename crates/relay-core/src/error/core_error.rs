//! Domain errors
//!
//! Errors raised while validating identities or (de)serializing envelopes.

use thiserror::Error;

/// Domain-level error type
#[derive(Debug, Error)]
pub enum CoreError {
    /// Client identity was missing or blank
    #[error("Client ID required")]
    EmptyClientId,

    /// Client identity exceeded the accepted length
    #[error("Client ID too long: {len} bytes (max {max})")]
    ClientIdTooLong { len: usize, max: usize },

    /// Inbound envelope could not be decoded
    #[error("Envelope decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// Outbound envelope could not be encoded
    #[error("Envelope encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// ICE server provider could not produce descriptors
    #[error("ICE server provider error: {0}")]
    Provider(String),
}

impl CoreError {
    /// Get error code for logs and API responses
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyClientId => "CLIENT_ID_REQUIRED",
            Self::ClientIdTooLong { .. } => "CLIENT_ID_TOO_LONG",
            Self::Decode(_) => "ENVELOPE_DECODE_ERROR",
            Self::Encode(_) => "ENVELOPE_ENCODE_ERROR",
            Self::Provider(_) => "ICE_PROVIDER_ERROR",
        }
    }

    /// Check if this error was caused by client input
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyClientId | Self::ClientIdTooLong { .. } | Self::Decode(_)
        )
    }
}

/// Result type for domain operations
pub type CoreResult<T> = Result<T, CoreError>;
