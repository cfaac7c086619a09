//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 10 * 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const STATE_DIR_NAME: &str = ".marmite";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API URL '{0}' (expected http:// or https://)")]
    InvalidApiUrl(String),
    #[error("{var} must be a positive number of seconds, got '{value}'")]
    InvalidDuration { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL without trailing slash.
    pub api_url: String,
    /// Period of the background access-token refresh.
    pub refresh_interval: Duration,
    pub timeouts: HttpTimeouts,
    /// Directory holding `tokens.json`.
    pub state_dir: PathBuf,
}

impl ClientConfig {
    /// Config with defaults for everything but the API URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] if the URL has no http(s) scheme.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: normalize_api_url(api_url)?,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            timeouts: HttpTimeouts::default(),
            state_dir: default_state_dir(std::env::var("HOME").ok()),
        })
    }

    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `MARMITE_API_URL`: default `http://localhost:5000`
    /// - `MARMITE_REFRESH_INTERVAL_SECS`: default 600
    /// - `MARMITE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `MARMITE_CONNECT_TIMEOUT_SECS`: default 10
    /// - `MARMITE_STATE_DIR`: default `$HOME/.marmite`
    ///
    /// # Errors
    ///
    /// Returns an error when a present variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns an error when a present variable cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = normalize_api_url(&lookup("MARMITE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned()))?;
        let refresh_secs =
            parse_secs(&lookup, "MARMITE_REFRESH_INTERVAL_SECS", DEFAULT_REFRESH_INTERVAL_SECS)?;
        let timeouts = HttpTimeouts {
            request_secs: parse_secs(&lookup, "MARMITE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_secs(&lookup, "MARMITE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let state_dir = lookup("MARMITE_STATE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| default_state_dir(lookup("HOME")), PathBuf::from);

        Ok(Self { api_url, refresh_interval: Duration::from_secs(refresh_secs), timeouts, state_dir })
    }

    /// Location of the persisted token file.
    #[must_use]
    pub fn token_path(&self) -> PathBuf {
        self.state_dir.join("tokens.json")
    }
}

fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidApiUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn parse_secs<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(ConfigError::InvalidDuration { var, value }),
        },
    }
}

fn default_state_dir(home: Option<String>) -> PathBuf {
    home.map_or_else(|| PathBuf::from(STATE_DIR_NAME), |h| PathBuf::from(h).join(STATE_DIR_NAME))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
