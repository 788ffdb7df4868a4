//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines the
//! tunable constants for HTTP timeouts, retries, caches and pagination.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// HTML template for a single bypass result.
    ///
    /// Placeholders: `{header_block}`, `{meta_block}`, `{links_block}`, `{original_url}`.
    #[serde(default = "default_bypass_template")]
    pub bypass_template: String,

    /// Link shown on the "Updates" button
    pub updates_url: Option<String>,
    /// Link shown on the "Repo" button
    pub repo_url: Option<String>,

    /// Endpoint prefix for the operator-specific gofile service; the file id is appended
    pub gofile_api_url: Option<String>,
}

/// Default layout of a bypass result message.
pub const DEFAULT_BYPASS_TEMPLATE: &str = "{header_block}\n\n{meta_block}<b>Links:</b>\n{links_block}\n\n<b>Original:</b> <a href=\"{original_url}\">Open</a>";

fn default_bypass_template() -> String {
    DEFAULT_BYPASS_TEMPLATE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            telegram_token: String::new(),
            bypass_template: default_bypass_template(),
            updates_url: None,
            repo_url: None,
            gofile_api_url: None,
        }
    }
}

/// Builds the layered configuration source used by [`Settings::new`].
///
/// # Errors
///
/// Returns a `ConfigError` if a present config file cannot be parsed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        // Eg.. `APP__REPO_URL=https://... ./target/app`
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Plain UPPER_SNAKE_CASE env vars; empty values count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the token is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let mut settings: Self = build_config()?.try_deserialize()?;

        if settings.gofile_api_url.is_none() {
            if let Ok(val) = std::env::var("GOFILE_API_URL") {
                if !val.is_empty() {
                    settings.gofile_api_url = Some(val);
                }
            }
        }

        if settings.telegram_token.trim().is_empty() {
            return Err(ConfigError::Message("TELEGRAM_TOKEN is not set".to_string()));
        }

        Ok(settings)
    }
}

/// User-Agent sent with every upstream request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Timeout for single bypass requests.
pub const BYPASS_HTTP_TIMEOUT_SECS: u64 = 20;
/// Timeout for the bulk bypass request (many links at once).
pub const BULK_HTTP_TIMEOUT_SECS: u64 = 60;
/// Timeout for a single poster worker attempt.
pub const POSTER_HTTP_TIMEOUT_SECS: u64 = 20;

/// Attempts (including the first) for poster worker requests.
pub const POSTER_MAX_ATTEMPTS: usize = 3;
/// Shortest backoff between poster attempts.
pub const POSTER_RETRY_MIN_MS: u64 = 1000;
/// Longest backoff between poster attempts.
pub const POSTER_RETRY_MAX_MS: u64 = 8000;

/// Lifetime of a cached upstream result (2 hours).
pub const RESULT_CACHE_TTL_SECS: u64 = 7200;
/// Maximum cached upstream results per fetcher.
pub const RESULT_CACHE_MAX_SIZE: u64 = 200;

/// Lifetime of a pagination session (1 day).
pub const SESSION_CACHE_TTL_SECS: u64 = 86_400;
/// Maximum live pagination sessions.
pub const SESSION_CACHE_MAX_SIZE: u64 = 1000;

/// Links shown per page before a result is paginated.
pub const LINKS_PER_PAGE: usize = 5;

// Telegram API retry configuration
/// Initial backoff for Telegram API retries
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Maximum backoff for Telegram API retries
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Maximum retries for Telegram API operations
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Get the single-bypass HTTP timeout from env or default.
///
/// Environment variable: `BYPASS_HTTP_TIMEOUT_SECS`.
#[must_use]
pub fn get_bypass_timeout() -> Duration {
    Duration::from_secs(env_or("BYPASS_HTTP_TIMEOUT_SECS", BYPASS_HTTP_TIMEOUT_SECS))
}

/// Get the bulk-bypass HTTP timeout from env or default.
///
/// Environment variable: `BULK_HTTP_TIMEOUT_SECS`.
#[must_use]
pub fn get_bulk_timeout() -> Duration {
    Duration::from_secs(env_or("BULK_HTTP_TIMEOUT_SECS", BULK_HTTP_TIMEOUT_SECS))
}

/// Get the poster HTTP timeout from env or default.
///
/// Environment variable: `POSTER_HTTP_TIMEOUT_SECS`.
#[must_use]
pub fn get_poster_timeout() -> Duration {
    Duration::from_secs(env_or("POSTER_HTTP_TIMEOUT_SECS", POSTER_HTTP_TIMEOUT_SECS))
}

/// Get the result cache TTL from env or default.
///
/// Environment variable: `RESULT_CACHE_TTL_SECS`.
#[must_use]
pub fn get_result_cache_ttl() -> u64 {
    env_or("RESULT_CACHE_TTL_SECS", RESULT_CACHE_TTL_SECS)
}

/// Get the result cache capacity from env or default.
///
/// Environment variable: `RESULT_CACHE_MAX_SIZE`.
#[must_use]
pub fn get_result_cache_max_size() -> u64 {
    env_or("RESULT_CACHE_MAX_SIZE", RESULT_CACHE_MAX_SIZE)
}

/// Get the pagination session TTL from env or default.
///
/// Environment variable: `SESSION_CACHE_TTL_SECS`.
#[must_use]
pub fn get_session_cache_ttl() -> u64 {
    env_or("SESSION_CACHE_TTL_SECS", SESSION_CACHE_TTL_SECS)
}

/// Get the pagination session capacity from env or default.
///
/// Environment variable: `SESSION_CACHE_MAX_SIZE`.
#[must_use]
pub fn get_session_cache_max_size() -> u64 {
    env_or("SESSION_CACHE_MAX_SIZE", SESSION_CACHE_MAX_SIZE)
}
