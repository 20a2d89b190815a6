//! Application configuration - environment loading
//!
//! Configuration is loaded from environment variables:
//! - `DATABASE_URL`: SQLite connection string (default: sqlite://dreams.db?mode=rwc)
//! - `DREAMS_DB_MAX_CONNECTIONS`: pool size (default: 5)
//! - `DREAMS_JWT_SECRET`: HS256 signing secret (default: insecure dev secret)
//! - `DREAMS_TOKEN_TTL_SECS`: access token lifetime (default: 86400)
//! - `DREAMS_MEDIA_URL`: prefix for image/photo URLs (default: /media/)

use std::str::FromStr;

use crate::db::pool::DEFAULT_MAX_CONNECTIONS;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://dreams.db?mode=rwc";

/// Used when no secret is configured. Startup logs a warning.
pub const DEV_JWT_SECRET: &str = "dreams-dev-secret-change-me";

pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

pub const DEFAULT_MEDIA_URL: &str = "/media/";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub media_url: String,
}

impl AppConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup (for testing)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_or(&lookup, "DREAMS_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            jwt_secret: lookup("DREAMS_JWT_SECRET")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            token_ttl_secs: parse_or(&lookup, "DREAMS_TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS),
            media_url: lookup("DREAMS_MEDIA_URL")
                .unwrap_or_else(|| DEFAULT_MEDIA_URL.to_string()),
        }
    }

    /// True when tokens are signed with the built-in development secret
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable config value");
            default
        }),
        None => default,
    }
}
