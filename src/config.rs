//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible defaults
//! for development. In production, configure via environment variables or a `.env` file.
//!
//! # Security Configuration
//!
//! - `JWT_SECRET`: Session token signing secret (at least 32 bytes; the default is for development only)
//! - `JWT_EXPIRY_SECS`: Session token lifetime (default: 7 days)
//! - `ADMIN_EMAILS` / `CREATOR_EMAILS`: Comma-separated emails granted the admin/creator flag at sign-up
//! - `SIGNIN_ATTEMPTS_PER_MINUTE`: Sign-in attempts allowed per email per minute (default: 10, 0 = unlimited)
//! - `CORS_ALLOWED_ORIGINS`: Comma-separated list of allowed origins (default: `*` for dev)
//!
//! # Usage Limits
//!
//! - `TIER_LIMIT_FREE`: Monthly reflections on the free tier (default: 3)
//! - `TIER_LIMIT_ESSENTIAL`: Monthly reflections on the essential tier (default: 10)
//! - `TIER_LIMIT_PREMIUM`: Monthly reflections on the premium tier (default: `unlimited`)

use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::limits::TierLimits;
use crate::models::Tier;

/// Development-only signing secret. `from_env` logs a warning when it is in use.
pub const DEV_JWT_SECRET: &str = "mirror-of-dreams-development-secret-change-me";

/// Minimum accepted length of `JWT_SECRET`, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    /// Maximum request body size in bytes (default: 1MB)
    pub max_request_body_size: usize,

    /// Allowed CORS origins; "*" allows any
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// HS256 secret for session tokens
    pub jwt_secret: String,

    /// Session token lifetime (default: 7 days)
    pub jwt_expiry: Duration,

    /// bcrypt work factor for password hashes (default: bcrypt's DEFAULT_COST)
    pub bcrypt_cost: u32,

    /// Emails that receive the admin flag when they sign up
    pub admin_emails: Vec<String>,

    /// Emails that receive the creator flag when they sign up
    pub creator_emails: Vec<String>,

    /// Email of the shared demo account
    pub demo_user_email: String,

    /// Sign-in attempts per email per minute (0 = unlimited)
    pub signin_attempts_per_minute: u32,

    // =========================================================================
    // Usage Limits
    // =========================================================================
    /// Monthly reflection ceiling per tier
    pub tier_limits: TierLimits,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any value is malformed or the
    /// resulting configuration fails validation.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = TierLimits::default();
        let tier_limits = TierLimits::new(
            Self::parse_env("TIER_LIMIT_FREE", defaults.limit_for(Tier::Free))?,
            Self::parse_env(
                "TIER_LIMIT_ESSENTIAL",
                defaults.limit_for(Tier::Essential),
            )?,
            Self::parse_env(
                "TIER_LIMIT_PREMIUM",
                defaults.limit_for(Tier::Premium),
            )?,
        )?;

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 3000)?,
            max_request_body_size: Self::parse_env("MAX_REQUEST_BODY_SIZE", 1024 * 1024)?,
            cors_allowed_origins: Self::parse_list("CORS_ALLOWED_ORIGINS", "*"),

            // Authentication
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),
            jwt_expiry: Duration::from_secs(Self::parse_env("JWT_EXPIRY_SECS", 7 * 24 * 3600)?),
            bcrypt_cost: Self::parse_env("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            admin_emails: Self::parse_emails("ADMIN_EMAILS"),
            creator_emails: Self::parse_emails("CREATOR_EMAILS"),
            demo_user_email: env::var("DEMO_USER_EMAIL")
                .unwrap_or_else(|_| "demo@mirrorofdreams.app".to_string())
                .to_lowercase(),
            signin_attempts_per_minute: Self::parse_env("SIGNIN_ATTEMPTS_PER_MINUTE", 10)?,

            // Usage limits
            tier_limits,

            // Observability
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        config.validate()?;

        if config.jwt_secret == DEV_JWT_SECRET {
            tracing::warn!("JWT_SECRET not set; using the development secret");
        }

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    fn validate(&self) -> AppResult<()> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(AppError::ConfigError(format!(
                "JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} bytes"
            )));
        }

        if self.jwt_expiry.is_zero() {
            return Err(AppError::ConfigError(
                "JWT_EXPIRY_SECS must be greater than 0".to_string(),
            ));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(AppError::ConfigError(
                "BCRYPT_COST must be between 4 and 31".to_string(),
            ));
        }

        if self.max_request_body_size == 0 {
            return Err(AppError::ConfigError(
                "MAX_REQUEST_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.demo_user_email.is_empty() {
            return Err(AppError::ConfigError(
                "DEMO_USER_EMAIL must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|e| e.eq_ignore_ascii_case(email))
    }

    pub fn is_creator_email(&self, email: &str) -> bool {
        self.creator_emails
            .iter()
            .any(|e| e.eq_ignore_ascii_case(email))
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse a comma-separated list, dropping empty entries.
    fn parse_list(name: &str, default: &str) -> Vec<String> {
        env::var(name)
            .unwrap_or_else(|_| default.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn parse_emails(name: &str) -> Vec<String> {
        Self::parse_list(name, "")
            .into_iter()
            .map(|e| e.to_lowercase())
            .collect()
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_request_body_size: 1024 * 1024,
            cors_allowed_origins: vec!["*".to_string()],
            // Authentication
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiry: Duration::from_secs(7 * 24 * 3600),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            admin_emails: vec![],
            creator_emails: vec![],
            demo_user_email: "demo@mirrorofdreams.app".to_string(),
            signin_attempts_per_minute: 10,
            // Usage limits
            tier_limits: TierLimits::default(),
            // Observability
            metrics_port: 9090,
        }
    }
}
