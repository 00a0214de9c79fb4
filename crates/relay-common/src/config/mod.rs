//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, ConnectionConfig, CorsConfig, CredentialsConfig,
    Environment, IceConfig, RateLimitConfig, ServerConfig, StaticConfig, TurnConfig,
    UpstreamConfig,
};
