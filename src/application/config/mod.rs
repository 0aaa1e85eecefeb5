pub mod database;
pub mod email;
pub mod scheduling;
pub mod security;
pub mod server;

use once_cell::sync::Lazy;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub database: database::DatabaseConfig,
    pub scheduling: scheduling::SchedulingConfig,
    pub email: email::EmailConfig,
    pub security: security::SecurityConfig,

    // Build info
    pub version: String,

    // Logging
    pub log_level: String,
    /// `text` (default) or `json`
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: server::ServerConfig::from_env(),
            database: database::DatabaseConfig::from_env(),
            scheduling: scheduling::SchedulingConfig::from_env(),
            email: email::EmailConfig::from_env(),
            security: security::SecurityConfig::from_env(),

            version: env!("CARGO_PKG_VERSION").to_string(),

            log_level: env::var("CENTERBOOK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("CENTERBOOK_LOG_FORMAT")
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|_| "text".to_string()),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

/// Parse a numeric environment variable, falling back to `default` when unset or malformed.
pub(crate) fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parse a boolean environment variable (`true`/`1`/`yes`).
pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}
