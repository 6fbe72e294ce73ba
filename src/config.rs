//! Client configuration.
//!
//! Every field has a default, so an absent or empty TOML file is a valid
//! configuration. Durations are whole seconds.
//!
//! ```toml
//! port = 6881
//! output_dir = "downloads"
//! max_peers = 30
//! request_timeout = 45
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use crate::constants::{
    CONNECT_TIMEOUT, DEFAULT_PORT, EVENT_CHANNEL_CAPACITY, KEEP_ALIVE_INTERVAL, MAX_PEERS,
    READ_TIMEOUT, REQUEST_TIMEOUT, SHUTDOWN_TIMEOUT, TICK_INTERVAL,
};
use crate::metainfo::InfoHash;
use crate::peer::{PeerId, SessionParams};
use crate::swarm::SwarmOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Port reported to the tracker.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Upper bound on tracker peers we connect to.
    #[serde(default = "default_max_peers")]
    pub max_peers: usize,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,
    #[serde(default = "default_keep_alive_interval")]
    pub keep_alive_interval: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_tick_interval")]
    pub tick_interval: u64,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `console` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_peers() -> usize {
    MAX_PEERS
}

fn default_event_capacity() -> usize {
    EVENT_CHANNEL_CAPACITY
}

fn default_connect_timeout() -> u64 {
    CONNECT_TIMEOUT.as_secs()
}

fn default_read_timeout() -> u64 {
    READ_TIMEOUT.as_secs()
}

fn default_keep_alive_interval() -> u64 {
    KEEP_ALIVE_INTERVAL.as_secs()
}

fn default_request_timeout() -> u64 {
    REQUEST_TIMEOUT.as_secs()
}

fn default_tick_interval() -> u64 {
    TICK_INTERVAL.as_secs()
}

fn default_shutdown_timeout() -> u64 {
    SHUTDOWN_TIMEOUT.as_secs()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            output_dir: default_output_dir(),
            max_peers: default_max_peers(),
            event_capacity: default_event_capacity(),
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            keep_alive_interval: default_keep_alive_interval(),
            request_timeout: default_request_timeout(),
            tick_interval: default_tick_interval(),
            shutdown_timeout: default_shutdown_timeout(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Loads and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_peers == 0 {
            return Err(invalid("max_peers must be greater than 0"));
        }
        if self.event_capacity == 0 {
            return Err(invalid("event_capacity must be greater than 0"));
        }

        for (name, secs) in [
            ("connect_timeout", self.connect_timeout),
            ("read_timeout", self.read_timeout),
            ("keep_alive_interval", self.keep_alive_interval),
            ("request_timeout", self.request_timeout),
            ("tick_interval", self.tick_interval),
            ("shutdown_timeout", self.shutdown_timeout),
        ] {
            if secs == 0 {
                return Err(invalid(format!("{} must be greater than 0", name)));
            }
        }

        if self.keep_alive_interval >= self.read_timeout {
            return Err(invalid(format!(
                "keep_alive_interval ({}) must be less than read_timeout ({})",
                self.keep_alive_interval, self.read_timeout
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "invalid log level '{}', expected one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        let valid_formats = ["console", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(invalid(format!(
                "invalid log format '{}', expected one of: {}",
                self.logging.format,
                valid_formats.join(", ")
            )));
        }

        Ok(())
    }

    /// Per-connection settings for a torrent with the given piece length.
    pub fn session_params(
        &self,
        info_hash: InfoHash,
        peer_id: PeerId,
        piece_length: u64,
    ) -> SessionParams {
        let mut params = SessionParams::new(info_hash, peer_id).with_piece_length(piece_length);
        params.connect_timeout = Duration::from_secs(self.connect_timeout);
        params.read_timeout = Duration::from_secs(self.read_timeout);
        params.keep_alive_interval = Duration::from_secs(self.keep_alive_interval);
        params
    }

    pub fn swarm_options(&self) -> SwarmOptions {
        SwarmOptions {
            request_timeout: Duration::from_secs(self.request_timeout),
            tick_interval: Duration::from_secs(self.tick_interval),
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout),
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}
