// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration and state directory resolution.
//!
//! Configuration is stored in `outbox.toml` in the state directory. Every
//! field has a default, so a missing file or a partial one is fine:
//!
//! ```toml
//! [remote]
//! url = "wss://sync.example.com/store"
//!
//! [sync]
//! max_attempts = 8
//!
//! [probe]
//! interval_ms = 10000
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env;
use crate::error::{Error, Result};
use crate::sync::{probe_addr_from_url, ClientConfig, EngineConfig, TcpProbe};

/// Configuration file name within the state directory.
pub const CONFIG_FILE_NAME: &str = "outbox.toml";
/// Log file name within the state directory.
pub const LOG_FILE_NAME: &str = "outbox.log";
const APP_DIR_NAME: &str = "outbox";

/// Settings loaded from `outbox.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

/// How to reach the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket URL (`ws://...` or `wss://...`).
    #[serde(default = "default_url")]
    pub url: String,
    /// Max time to wait for the reply to one request, in milliseconds (default: 10000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Connection attempts per request before giving up (default: 3).
    #[serde(default = "default_reconnect_max_retries")]
    pub reconnect_max_retries: u32,
    /// Delay before the second connection attempt, in milliseconds (default: 100).
    #[serde(default = "default_reconnect_initial_delay_ms")]
    pub reconnect_initial_delay_ms: u64,
    /// Maximum delay between connection attempts in seconds (default: 30).
    #[serde(default = "default_reconnect_max_delay_secs")]
    pub reconnect_max_delay_secs: u64,
}

/// Drain and retry behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Failed attempts after which a mutation is abandoned (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first follow-up drain, in milliseconds (default: 500).
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,
    /// Cap on the follow-up delay, in milliseconds (default: 60000).
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    #[serde(default = "default_max_listeners")]
    pub max_listeners: usize,
    /// Events buffered per listener (default: 64).
    #[serde(default = "default_listener_capacity")]
    pub listener_capacity: usize,
}

/// Reachability probing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Time between probes in milliseconds (default: 5000).
    #[serde(default = "default_probe_interval_ms")]
    pub interval_ms: u64,
    /// Time allowed for one probe in milliseconds (default: 2000).
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
    /// `host:port` to probe. Derived from the remote URL when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
}

fn default_url() -> String {
    "ws://localhost:7890".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_reconnect_max_retries() -> u32 {
    3
}

fn default_reconnect_initial_delay_ms() -> u64 {
    100
}

fn default_reconnect_max_delay_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_initial_ms() -> u64 {
    500
}

fn default_backoff_max_ms() -> u64 {
    60_000
}

fn default_max_listeners() -> usize {
    32
}

fn default_listener_capacity() -> usize {
    64
}

fn default_probe_interval_ms() -> u64 {
    5_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: default_url(),
            request_timeout_ms: default_request_timeout_ms(),
            reconnect_max_retries: default_reconnect_max_retries(),
            reconnect_initial_delay_ms: default_reconnect_initial_delay_ms(),
            reconnect_max_delay_secs: default_reconnect_max_delay_secs(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            max_attempts: default_max_attempts(),
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            max_listeners: default_max_listeners(),
            listener_capacity: default_listener_capacity(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            interval_ms: default_probe_interval_ms(),
            timeout_ms: default_probe_timeout_ms(),
            addr: None,
        }
    }
}

impl RemoteConfig {
    /// Validates that the URL is a WebSocket URL with a host.
    ///
    /// Returns an error message if the URL is invalid.
    pub fn validate_url(&self) -> Option<String> {
        match url::Url::parse(&self.url) {
            Ok(parsed) if !matches!(parsed.scheme(), "ws" | "wss") => Some(format!(
                "invalid remote URL '{}': must be ws:// or wss://",
                self.url
            )),
            Ok(parsed) if parsed.host_str().is_none() => {
                Some(format!("invalid remote URL '{}': missing host", self.url))
            }
            Ok(_) => None,
            Err(e) => Some(format!("invalid remote URL '{}': {}", self.url, e)),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            url: self.url.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_retries: self.reconnect_max_retries,
            initial_delay_ms: self.reconnect_initial_delay_ms,
            max_delay_secs: self.reconnect_max_delay_secs,
        }
    }
}

impl SyncConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_attempts: self.max_attempts,
            backoff_initial: Duration::from_millis(self.backoff_initial_ms),
            backoff_max: Duration::from_millis(self.backoff_max_ms),
            max_listeners: self.max_listeners,
            listener_capacity: self.listener_capacity,
        }
    }
}

impl ProbeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Builds the probe for `remote`, using the configured address if any.
    pub fn probe_for(&self, remote: &RemoteConfig) -> Result<TcpProbe> {
        let addr = match &self.addr {
            Some(addr) => addr.clone(),
            None => probe_addr_from_url(&remote.url).ok_or_else(|| {
                Error::Config(format!("cannot derive probe address from '{}'", remote.url))
            })?,
        };
        Ok(TcpProbe::new(addr, Duration::from_millis(self.timeout_ms)))
    }
}

impl Config {
    /// Loads `outbox.toml` from `state_dir`, or defaults if it does not exist.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    /// Parses and validates configuration text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(msg) = self.remote.validate_url() {
            return Err(Error::Config(msg));
        }
        if self.sync.max_attempts == 0 {
            return Err(Error::Config("sync.max_attempts must be at least 1".to_string()));
        }
        if self.sync.max_listeners == 0 {
            return Err(Error::Config("sync.max_listeners must be at least 1".to_string()));
        }
        if self.probe.interval_ms == 0 {
            return Err(Error::Config("probe.interval_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Resolves the state directory.
///
/// Precedence: `--state-dir`, `OUTBOX_STATE_DIR`, `$XDG_STATE_HOME/outbox`,
/// `~/.local/state/outbox`.
pub fn resolve_state_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    state_dir_from(flag, env::state_dir(), env::xdg_state_home(), dirs::home_dir())
}

fn state_dir_from(
    flag: Option<PathBuf>,
    explicit: Option<PathBuf>,
    xdg_state_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(dir) = flag.or(explicit) {
        return Ok(dir);
    }
    if let Some(xdg) = xdg_state_home {
        return Ok(xdg.join(APP_DIR_NAME));
    }
    home.map(|h| h.join(".local/state").join(APP_DIR_NAME)).ok_or(Error::NoStateDir)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
