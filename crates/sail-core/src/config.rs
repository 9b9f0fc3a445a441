//! Centralized configuration for the SAIL source library.
//!
//! Provides configuration constants for network operations and on-disk
//! layout, plus the environment-resolved connection settings for the Appian
//! Deployment API.

use crate::error::{Result, SailError};
use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    /// Package downloads can be large; keep a generous ceiling.
    pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);
    pub const CHECKLIST_TIMEOUT: Duration = Duration::from_secs(30);
    /// Deployment export polling: interval and attempt ceiling.
    /// 60 attempts at 5s matches the platform's own export UI budget.
    pub const EXPORT_POLL_INTERVAL: Duration = Duration::from_secs(5);
    pub const EXPORT_POLL_MAX_ATTEMPTS: u32 = 60;
    /// TTL for the in-memory archive cache tier.
    pub const ARCHIVE_MEMORY_TTL: Duration = Duration::from_secs(3600);
    pub const USER_AGENT: &'static str = "sail-source/0.3";
}

/// Shared directory and path configurations.
pub struct PathsConfig;

impl PathsConfig {
    pub const CACHE_DIR_NAME: &'static str = "cache";
    pub const CHECKLIST_CACHE_FILENAME: &'static str = "aurora-a11y-checklist.txt";
    pub const ARCHIVE_EXTENSION: &'static str = "zip";
    pub const ARCHIVE_META_EXTENSION: &'static str = "json";
    pub const PARTIAL_SUFFIX: &'static str = "part";
}

/// Environment variables consulted by [`Connection::from_env`].
pub const APPIAN_URL_ENV: &str = "APPIAN_URL";
pub const APPIAN_API_KEY_ENV: &str = "APPIAN_API_KEY";
pub const APPIAN_APP_UUID_ENV: &str = "APPIAN_APP_UUID";

/// Connection settings for one Appian environment.
///
/// The api key is deliberately not `Debug`-printed.
#[derive(Clone)]
pub struct Connection {
    /// Base URL of the environment, e.g. `https://mysite.appiancloud.com`.
    pub base_url: String,
    /// API key with deployment permissions.
    pub api_key: String,
    /// Default application uuid to export when the caller names none.
    pub default_app_uuid: Option<String>,
}

impl Connection {
    /// Build a connection from explicit values.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            default_app_uuid: None,
        }
    }

    /// Resolve connection settings from `APPIAN_URL` / `APPIAN_API_KEY` /
    /// `APPIAN_APP_UUID`.
    ///
    /// Returns `Ok(None)` when no environment is configured (local-zip-only
    /// operation), and an error when the configuration is half-present.
    pub fn from_env() -> Result<Option<Self>> {
        let base_url = std::env::var(APPIAN_URL_ENV).ok().filter(|s| !s.is_empty());
        let api_key = std::env::var(APPIAN_API_KEY_ENV)
            .ok()
            .filter(|s| !s.is_empty());

        match (base_url, api_key) {
            (Some(base_url), Some(api_key)) => {
                let mut conn = Self::new(base_url, api_key);
                conn.default_app_uuid = std::env::var(APPIAN_APP_UUID_ENV)
                    .ok()
                    .filter(|s| !s.is_empty());
                Ok(Some(conn))
            }
            (None, None) => Ok(None),
            (Some(_), None) => Err(SailError::Config {
                message: format!("{APPIAN_URL_ENV} is set but {APPIAN_API_KEY_ENV} is not"),
            }),
            (None, Some(_)) => Err(SailError::Config {
                message: format!("{APPIAN_API_KEY_ENV} is set but {APPIAN_URL_ENV} is not"),
            }),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("default_app_uuid", &self.default_app_uuid)
            .finish()
    }
}
