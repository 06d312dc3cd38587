//! Socket server configuration.
//!
//! Loaded once at startup from `{config_dir}/terminal-socket.json`. Every field
//! is optional in the file; missing fields take their defaults.

use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::net::IpAddr;
use std::ops::Range;
use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "terminal-socket.json";
const CONFIG_VERSION: u32 = 1;

pub const DEFAULT_PORT_RANGE_START: u16 = 3000;
pub const DEFAULT_PORT_RANGE_END: u16 = 8000;
pub const DEFAULT_MAX_PORT_RETRIES: u32 = 20;
const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MAX_REQUEST_HEAD_BYTES: usize = 8192;
const MIN_REQUEST_HEAD_BYTES: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Interface the listener binds to.
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// First candidate port (inclusive).
    #[serde(default = "default_port_range_start")]
    pub port_range_start: u16,

    /// Last candidate port (exclusive).
    #[serde(default = "default_port_range_end")]
    pub port_range_end: u16,

    /// Random candidates tried before giving up with `PortExhausted`.
    #[serde(default = "default_max_port_retries")]
    pub max_port_retries: u32,

    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,

    #[serde(default = "default_max_request_head_bytes")]
    pub max_request_head_bytes: usize,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            bind_host: default_bind_host(),
            port_range_start: DEFAULT_PORT_RANGE_START,
            port_range_end: DEFAULT_PORT_RANGE_END,
            max_port_retries: DEFAULT_MAX_PORT_RETRIES,
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
            max_request_head_bytes: DEFAULT_MAX_REQUEST_HEAD_BYTES,
        }
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_bind_host() -> String {
    crate::TERMINAL_SOCKET_HOSTNAME.to_string()
}
fn default_port_range_start() -> u16 {
    DEFAULT_PORT_RANGE_START
}
fn default_port_range_end() -> u16 {
    DEFAULT_PORT_RANGE_END
}
fn default_max_port_retries() -> u32 {
    DEFAULT_MAX_PORT_RETRIES
}
fn default_handshake_timeout_ms() -> u64 {
    DEFAULT_HANDSHAKE_TIMEOUT_MS
}
fn default_max_request_head_bytes() -> usize {
    DEFAULT_MAX_REQUEST_HEAD_BYTES
}

impl SocketConfig {
    /// Load config from `{config_dir}/terminal-socket.json`.
    ///
    /// A missing file is not an error: defaults are returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read, parsed or validated.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Socket config not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read socket config: {e}");
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: SocketConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse socket config: {e}");
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Socket config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to `{config_dir}/terminal-socket.json` (temp file + rename).
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Socket config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(invalid(
                "version",
                format!("{} (expected 1-{CONFIG_VERSION})", self.version),
            ));
        }

        self.bind_ip()?;

        if self.port_range_start == 0 {
            return Err(invalid("port_range_start", "must be greater than 0".into()));
        }

        if self.port_range_end <= self.port_range_start {
            return Err(invalid(
                "port_range_end",
                format!(
                    "{} must be greater than port_range_start {}",
                    self.port_range_end, self.port_range_start
                ),
            ));
        }

        if self.max_port_retries == 0 {
            return Err(invalid("max_port_retries", "must be greater than 0".into()));
        }

        if self.handshake_timeout_ms == 0 {
            return Err(invalid(
                "handshake_timeout_ms",
                "must be greater than 0".into(),
            ));
        }

        if self.max_request_head_bytes < MIN_REQUEST_HEAD_BYTES {
            return Err(invalid(
                "max_request_head_bytes",
                format!("must be at least {MIN_REQUEST_HEAD_BYTES}"),
            ));
        }

        Ok(())
    }

    /// Parsed [`Self::bind_host`].
    #[track_caller]
    pub fn bind_ip(&self) -> Result<IpAddr, ConfigError> {
        self.bind_host
            .parse::<IpAddr>()
            .map_err(|e| invalid("bind_host", format!("'{}': {e}", self.bind_host)))
    }

    pub fn port_range(&self) -> Range<u16> {
        self.port_range_start..self.port_range_end
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

#[track_caller]
fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        field,
        reason,
    }
}
