//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOP_SEED_PASSWORD` - Password given to every seeded account (min 8 chars)
//!
//! ## Optional
//! - `SHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOP_PORT` - Listen port (default: 3000)
//! - `SHOP_SLOW_DELAY_MS` - Delay for `performance_glitch_user` (default: 3000)
//! - `SHOP_FAILURE_DELAY_MS` - Delay before `error_user` checkout fails (default: 1500)
//! - `SHOP_SESSION_IDLE_SECS` - Idle time before a session expires (default: 86400)
//! - `SHOP_RATE_LIMIT_ENABLED` - Enable request rate limiting (default: true)
//! - `SHOP_RATE_LIMIT_WINDOW_SECS` - Rate limit window (default: 60)
//! - `SHOP_RATE_LIMIT_AUTH` - Login attempts per window (default: 10)
//! - `SHOP_RATE_LIMIT_ANONYMOUS` - Anonymous API requests per window (default: 100)
//! - `SHOP_RATE_LIMIT_AUTHENTICATED` - Customer API requests per window (default: 300)
//! - `SHOP_RATE_LIMIT_ADMIN` - Admin API requests per window (default: 1000)
//! - `SHOP_CORS_ORIGINS` - Comma-separated allowed origins (default: any)
//! - `SHOP_LOG_JSON` - Emit JSON log lines instead of text (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use practice_shop_core::latency::LatencyInjector;
use practice_shop_core::{RateLimits, ShopSettings};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SEED_PASSWORD_LENGTH: usize = 8;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Request rate limiting configuration.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Whether requests are rate limited at all
    pub enabled: bool,
    /// Window and per-tier limits
    pub limits: RateLimits,
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Password for every seeded account
    pub seed_password: SecretString,
    /// Delay injected for slow identities
    pub slow_delay: Duration,
    /// Delay before an injected checkout failure
    pub failure_delay: Duration,
    /// Idle time before a session is evicted
    pub session_idle: Duration,
    /// Rate limiting
    pub rate_limit: RateLimitConfig,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "ci", "local")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

impl ShopConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the seed password fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`ShopConfig::from_env`].
    pub fn from_vars(vars: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = &vars;

        let seed_password = get_required_secret(vars, "SHOP_SEED_PASSWORD")?;
        validate_seed_password(&seed_password, "SHOP_SEED_PASSWORD")?;

        let defaults = RateLimits::default();
        let rate_limit = RateLimitConfig {
            enabled: parse_env(vars, "SHOP_RATE_LIMIT_ENABLED", true)?,
            limits: RateLimits {
                window: Duration::from_secs(parse_env(
                    vars,
                    "SHOP_RATE_LIMIT_WINDOW_SECS",
                    defaults.window.as_secs(),
                )?),
                auth: parse_env(vars, "SHOP_RATE_LIMIT_AUTH", defaults.auth)?,
                anonymous: parse_env(vars, "SHOP_RATE_LIMIT_ANONYMOUS", defaults.anonymous)?,
                authenticated: parse_env(
                    vars,
                    "SHOP_RATE_LIMIT_AUTHENTICATED",
                    defaults.authenticated,
                )?,
                admin: parse_env(vars, "SHOP_RATE_LIMIT_ADMIN", defaults.admin)?,
            },
        };
        if rate_limit.limits.window.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "SHOP_RATE_LIMIT_WINDOW_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let session_idle = Duration::from_secs(parse_env(vars, "SHOP_SESSION_IDLE_SECS", 86_400)?);
        if session_idle.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "SHOP_SESSION_IDLE_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let cors_origins = vars("SHOP_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: parse_env(vars, "SHOP_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_env(vars, "SHOP_PORT", 3000)?,
            seed_password,
            slow_delay: Duration::from_millis(parse_env(vars, "SHOP_SLOW_DELAY_MS", 3000)?),
            failure_delay: Duration::from_millis(parse_env(vars, "SHOP_FAILURE_DELAY_MS", 1500)?),
            session_idle,
            rate_limit,
            cors_origins,
            log_json: parse_env(vars, "SHOP_LOG_JSON", false)?,
            sentry_dsn: vars("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: vars("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env(vars, "SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: parse_env(vars, "SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Engine settings derived from this configuration.
    #[must_use]
    pub const fn shop_settings(&self) -> ShopSettings {
        ShopSettings {
            session_idle: self.session_idle,
            latency: LatencyInjector::new(self.slow_delay, self.failure_delay),
            rate_limits: self.rate_limit.limits,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(
    vars: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    vars(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(
    vars: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<SecretString, ConfigError> {
    let value = get_required_env(vars, key)?;
    Ok(SecretString::from(value))
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env<T>(
    vars: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    vars(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Validate that the seed password is long enough and not a placeholder.
fn validate_seed_password(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.chars().count() < MIN_SEED_PASSWORD_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SEED_PASSWORD_LENGTH,
                value.chars().count()
            ),
        ));
    }

    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}
