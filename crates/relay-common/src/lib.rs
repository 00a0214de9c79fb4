//! # relay-common
//!
//! Shared utilities including configuration, error handling, telemetry and the
//! HTTP plumbing used by both the signaling hub and the proxy.

pub mod config;
pub mod error;
pub mod http;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    AppConfig, AppSettings, ConfigError, ConnectionConfig, CorsConfig, CredentialsConfig,
    Environment, IceConfig, RateLimitConfig, ServerConfig, StaticConfig, TurnConfig,
    UpstreamConfig,
};
pub use error::AppError;
pub use http::{cors_layer, ApiError, ApiResult, ClientIdentity, USER_ID_HEADER};
pub use telemetry::{try_init_tracing_with_config, TracingConfig, TracingError};
