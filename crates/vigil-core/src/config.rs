//! Configuration for the Vigil console.
//!
//! Loaded from `~/.vigil/config.yaml` (or a path given on the command
//! line). Every section has sensible defaults so a missing file means
//! "point at localhost and poll every 15 seconds", not a crash.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VigilError};

/// Top-level Vigil configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    /// Backend endpoints
    pub server: ServerConfig,

    /// Poll cycle tuning
    pub poll: PollConfig,

    /// Live update socket tuning
    pub socket: SocketConfig,

    /// Arrival notification toggles
    pub notifications: NotificationConfig,
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the alerting hub, e.g. `http://localhost:8000`
    pub base_url: String,

    /// Path of the alert-list fragment endpoint
    pub alerts_path: String,

    /// WebSocket URL for live pushes, e.g. `ws://localhost:8000/ws/alerts/`
    pub socket_url: String,

    /// Query parameters forwarded on every fragment fetch
    /// (filters, pagination), as `key=value` pairs
    pub query: Vec<(String, String)>,

    /// CSRF token sent with comment submissions, if the backend wants one
    pub csrf_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            alerts_path: "/api/alerts/unacknowledged/".to_string(),
            socket_url: "ws://localhost:8000/ws/alerts/".to_string(),
            query: Vec::new(),
            csrf_token: None,
        }
    }
}

/// Poll cycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between refreshes (the countdown start value)
    pub interval_secs: u64,

    /// Per-request timeout in seconds (bounds the fetching phase)
    pub timeout_secs: u64,

    /// Cap on the backoff delay after consecutive failures, in seconds
    pub backoff_max_secs: u64,

    /// Backoff multiplier applied per consecutive failure
    pub backoff_multiplier: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 15,
            timeout_secs: 10,
            backoff_max_secs: 300,
            backoff_multiplier: 2.0,
        }
    }
}

/// Live update socket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketConfig {
    /// Whether the push channel is used at all
    pub enabled: bool,

    /// Base reconnect delay in seconds
    pub reconnect_base_secs: u64,

    /// Cap on the reconnect delay in seconds
    pub reconnect_max_secs: u64,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reconnect_base_secs: 3,
            reconnect_max_secs: 60,
        }
    }
}

/// Arrival notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Ring the terminal bell when new alerts arrive
    pub sound: bool,

    /// Emit a desktop notification escape when new alerts arrive
    pub desktop: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            sound: true,
            desktop: false,
        }
    }
}

impl VigilConfig {
    /// Load configuration from the given path, or from the default
    /// location when `path` is None. A missing default file yields
    /// the built-in defaults; an explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_path()?, false),
        };

        if !file.exists() {
            if required {
                return Err(VigilError::config_not_found(file));
            }
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&file)
            .map_err(|e| VigilError::io("reading config", file.clone(), e))?;
        let config: Self = serde_yaml::from_str(&raw).map_err(|e| VigilError::ConfigInvalid {
            path: file,
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot possibly work.
    pub fn validate(&self) -> Result<()> {
        if self.server.base_url.is_empty() {
            return Err(VigilError::config_validation("server.base_url is empty"));
        }
        if self.poll.interval_secs == 0 {
            return Err(VigilError::config_validation(
                "poll.interval_secs must be at least 1",
            ));
        }
        if self.poll.timeout_secs == 0 {
            return Err(VigilError::config_validation(
                "poll.timeout_secs must be at least 1",
            ));
        }
        if self.poll.backoff_multiplier < 1.0 {
            return Err(VigilError::config_validation(
                "poll.backoff_multiplier must be >= 1.0",
            ));
        }
        if self.socket.enabled && self.server.socket_url.is_empty() {
            return Err(VigilError::config_validation(
                "server.socket_url is empty but socket.enabled is true",
            ));
        }
        Ok(())
    }

    /// Override the backend base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.server.base_url = url.into();
        self
    }

    /// Override the poll interval.
    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.poll.interval_secs = secs;
        self
    }

    /// Disable the live update socket.
    pub fn without_socket(mut self) -> Self {
        self.socket.enabled = false;
        self
    }
}

/// Default configuration file path (`~/.vigil/config.yaml`).
pub fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").map_err(|_| VigilError::Internal {
        message: "HOME environment variable not set".into(),
    })?;

    Ok(PathBuf::from(home).join(".vigil").join("config.yaml"))
}
