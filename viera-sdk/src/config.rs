//! Device configuration
//!
//! Mirrors what the host hands the adapter: the television's IP, optional
//! pairing credentials and the poll cadence. Loaded from JSON.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use viera_api::DeviceEndpoint;

/// Default interval between status checks
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
/// Default bound on each request to the television
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Please configure the television IP address")]
    MissingIp,

    #[error("Invalid IP address: {0}")]
    InvalidIp(String),

    #[error("app_id and encryption_key must be configured together")]
    PartialCredentials,

    #[error("{0} must be greater than 0")]
    ZeroDuration(&'static str),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration for one television
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VieraConfig {
    /// IPv4 address of the television
    pub ip: String,

    /// Application id from pairing
    #[serde(default)]
    pub app_id: Option<String>,

    /// Base64 encryption key from pairing
    #[serde(default)]
    pub encryption_key: Option<String>,

    /// Seconds between status checks
    /// Default: 60
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Per-request timeout in milliseconds
    /// Default: 5000
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl VieraConfig {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            app_id: None,
            encryption_key: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    pub fn with_credentials(mut self, app_id: impl Into<String>, encryption_key: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self.encryption_key = Some(encryption_key.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_secs = interval.as_secs();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ip = self.ip.trim();
        if ip.is_empty() || ip == "0.0.0.0" {
            return Err(ConfigError::MissingIp);
        }

        if DeviceEndpoint::new(ip).is_err() {
            return Err(ConfigError::InvalidIp(self.ip.clone()));
        }

        if self.app_id().is_some() != self.encryption_key().is_some() {
            return Err(ConfigError::PartialCredentials);
        }

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("poll_interval_secs"));
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("request_timeout_ms"));
        }

        Ok(())
    }

    /// Application id, treating an empty string as unset
    pub fn app_id(&self) -> Option<&str> {
        non_empty(self.app_id.as_deref())
    }

    /// Encryption key, treating an empty string as unset
    pub fn encryption_key(&self) -> Option<&str> {
        non_empty(self.encryption_key.as_deref())
    }

    /// Build the device endpoint after validating
    pub fn endpoint(&self) -> Result<DeviceEndpoint, ConfigError> {
        self.validate()?;

        let endpoint =
            DeviceEndpoint::new(self.ip.trim()).map_err(|_| ConfigError::InvalidIp(self.ip.clone()))?;

        Ok(match (self.app_id(), self.encryption_key()) {
            (Some(app_id), Some(key)) => endpoint.with_credentials(app_id, key),
            _ => endpoint,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
