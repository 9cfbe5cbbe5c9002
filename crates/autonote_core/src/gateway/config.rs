//! Gateway configuration from environment.
//!
//! # Invariants
//! - `base_url` is an absolute `http`/`https` URL.
//! - `timeout` is strictly positive.

use reqwest::Url;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const API_URL_ENV: &str = "AUTONOTE_API_URL";
pub const API_TIMEOUT_ENV: &str = "AUTONOTE_API_TIMEOUT_SECS";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidUrl { value: String, message: String },
    UnsupportedScheme(String),
    InvalidTimeout(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl { value, message } => {
                write!(f, "invalid api url `{value}`: {message}")
            }
            Self::UnsupportedScheme(scheme) => {
                write!(f, "unsupported api url scheme `{scheme}`; expected http|https")
            }
            Self::InvalidTimeout(value) => {
                write!(f, "invalid timeout `{value}`; expected a positive number of seconds")
            }
        }
    }
}

impl Error for ConfigError {}

/// Connection settings for [`crate::gateway::http::HttpNotesGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ConfigError> {
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(timeout_secs.to_string()));
        }
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Reads `AUTONOTE_API_URL` and `AUTONOTE_API_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds config from an arbitrary key lookup, applying defaults for
    /// missing or blank values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(API_URL_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout_secs = match lookup(API_TIMEOUT_ENV).filter(|value| !value.trim().is_empty()) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(value.clone()))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        Self::new(base_url.as_str(), timeout_secs)
    }
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|err| ConfigError::InvalidUrl {
        value: value.to_string(),
        message: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}
