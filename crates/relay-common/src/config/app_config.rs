//! Application configuration structs
//!
//! Loads configuration from environment variables (and an optional `.env` file).

use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::num::{NonZeroU64, NonZeroUsize};
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub hub: ServerConfig,
    pub proxy: ServerConfig,
    pub upstream: UpstreamConfig,
    pub rate_limit: RateLimitConfig,
    pub ice: IceConfig,
    pub credentials: CredentialsConfig,
    pub connection: ConnectionConfig,
    pub cors: CorsConfig,
    pub static_files: StaticConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Listener configuration (for both hub and proxy)
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve the listen address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.address()
            .parse()
            .map_err(|_| ConfigError::InvalidValue("HOST", self.address()))
    }
}

/// Fixed upstream the proxy dials for every client
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub url: String,
    /// `Origin` header presented to the upstream
    pub origin: String,
    /// Trace-log every forwarded payload
    #[serde(default)]
    pub debug_payloads: bool,
}

/// Control-plane rate limiting
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Cooldown between two granted ICE server requests from one client
    #[serde(default = "default_ice_cooldown_secs")]
    pub ice_cooldown_secs: u64,
}

impl RateLimitConfig {
    #[must_use]
    pub fn ice_cooldown(&self) -> Duration {
        Duration::from_secs(self.ice_cooldown_secs)
    }
}

/// ICE server descriptors handed to clients
#[derive(Debug, Clone, Deserialize)]
pub struct IceConfig {
    pub stun_urls: Vec<String>,
    pub turn: Option<TurnConfig>,
}

/// TURN entry with its credential pair
#[derive(Debug, Clone, Deserialize)]
pub struct TurnConfig {
    pub url: String,
    pub username: String,
    pub credential: String,
}

/// Upstream credential issuer for `/turn-credentials`
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    pub upstream_url: Option<String>,
    #[serde(default = "default_credentials_timeout_secs")]
    pub timeout_secs: u64,
}

impl CredentialsConfig {
    /// Bound on one round trip to the issuer
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            upstream_url: None,
            timeout_secs: default_credentials_timeout_secs(),
        }
    }
}

/// Per-connection limits for the signaling hub
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl ConnectionConfig {
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// Empty means any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Static asset serving
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticConfig {
    pub dir: Option<String>,
}

// Default value functions
fn default_app_name() -> String {
    "relay".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_hub_port() -> u16 {
    8080
}

fn default_proxy_port() -> u16 {
    8081
}

fn default_upstream_url() -> String {
    "ws://localhost:8082/communication/v1/ws".to_string()
}

fn default_upstream_origin() -> String {
    "http://localhost:8081".to_string()
}

fn default_ice_cooldown_secs() -> u64 {
    30
}

fn default_stun_urls() -> Vec<String> {
    vec!["stun:stun.l.google.com:19302".to_string()]
}

fn default_credentials_timeout_secs() -> u64 {
    10
}

fn default_idle_timeout_secs() -> u64 {
    120
}

fn default_outbound_buffer() -> usize {
    100
}

/// Split a comma-separated list, dropping blanks
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is present but cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let env = match var("APP_ENV") {
            Some(raw) => Environment::parse(&raw)
                .ok_or(ConfigError::InvalidValue("APP_ENV", raw))?,
            None => default_env(),
        };

        let turn = match (
            var("ICE_TURN_URL"),
            var("ICE_TURN_USERNAME"),
            var("ICE_TURN_CREDENTIAL"),
        ) {
            (Some(url), Some(username), Some(credential)) => Some(TurnConfig {
                url,
                username,
                credential,
            }),
            (None, None, None) => None,
            _ => {
                return Err(ConfigError::InvalidValue(
                    "ICE_TURN_URL",
                    "ICE_TURN_URL, ICE_TURN_USERNAME and ICE_TURN_CREDENTIAL must be set together"
                        .to_string(),
                ))
            }
        };

        Ok(Self {
            app: AppSettings {
                name: var("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            hub: ServerConfig {
                host: var("HUB_HOST").unwrap_or_else(default_host),
                port: parse_var(&var, "HUB_PORT")?.unwrap_or_else(default_hub_port),
            },
            proxy: ServerConfig {
                host: var("PROXY_HOST").unwrap_or_else(default_host),
                port: parse_var(&var, "PROXY_PORT")?.unwrap_or_else(default_proxy_port),
            },
            upstream: UpstreamConfig {
                url: var("PROXY_UPSTREAM_URL").unwrap_or_else(default_upstream_url),
                origin: var("PROXY_ORIGIN").unwrap_or_else(default_upstream_origin),
                debug_payloads: parse_var(&var, "PROXY_DEBUG_PAYLOADS")?.unwrap_or(false),
            },
            rate_limit: RateLimitConfig {
                ice_cooldown_secs: parse_var(&var, "ICE_RATE_LIMIT_SECS")?
                    .unwrap_or_else(default_ice_cooldown_secs),
            },
            ice: IceConfig {
                stun_urls: var("ICE_STUN_URLS")
                    .map(|s| split_list(&s))
                    .unwrap_or_else(default_stun_urls),
                turn,
            },
            credentials: CredentialsConfig {
                upstream_url: var("TURN_CREDENTIALS_URL"),
                timeout_secs: parse_var(&var, "TURN_CREDENTIALS_TIMEOUT_SECS")?
                    .map(NonZeroU64::get)
                    .unwrap_or_else(default_credentials_timeout_secs),
            },
            connection: ConnectionConfig {
                idle_timeout_secs: parse_var(&var, "CONNECTION_IDLE_TIMEOUT_SECS")?
                    .map(NonZeroU64::get)
                    .unwrap_or_else(default_idle_timeout_secs),
                outbound_buffer: parse_var(&var, "CONNECTION_OUTBOUND_BUFFER")?
                    .map(NonZeroUsize::get)
                    .unwrap_or_else(default_outbound_buffer),
            },
            cors: CorsConfig {
                allowed_origins: var("CORS_ALLOWED_ORIGINS")
                    .map(|s| split_list(&s))
                    .unwrap_or_default(),
            },
            static_files: StaticConfig {
                dir: var("STATIC_DIR"),
            },
        })
    }
}

/// Parse an optional variable, failing on malformed values
fn parse_var<T, F>(var: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key, raw))
        })
        .transpose()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
