//! Runtime configuration.
//!
//! Loaded from an optional `narrow.toml`, with every field defaulted so
//! an empty or missing file is valid. CLI flags override file values in
//! `cli::run`.

use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Config file looked up in the working directory when `--config` is
/// not given.
pub const CONFIG_FILE: &str = "narrow.toml";

/// Proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Port the proxy listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Seconds between statistics flushes.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Host of the upstream target server.
    #[serde(default = "default_target_host")]
    pub target_host: String,

    /// Port of the upstream target server.
    #[serde(default = "default_target_port")]
    pub target_port: u16,

    /// Client IPs refused outright.
    #[serde(default)]
    pub blacklist: Vec<IpAddr>,

    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

/// Monitoring upload settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitoringConfig {
    /// Whether snapshots are uploaded at each flush.
    #[serde(default)]
    pub enabled: bool,

    /// Monitoring server base URL.
    #[serde(default = "default_monitoring_server")]
    pub server: String,

    /// API key sent as a bearer token. Empty means unauthenticated.
    #[serde(default)]
    pub key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            interval_secs: default_interval_secs(),
            target_host: default_target_host(),
            target_port: default_target_port(),
            blacklist: Vec::new(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server: default_monitoring_server(),
            key: String::new(),
        }
    }
}

fn default_listen_port() -> u16 {
    8000
}

fn default_interval_secs() -> u64 {
    60
}

fn default_target_host() -> String {
    "localhost".to_string()
}

fn default_target_port() -> u16 {
    3000
}

fn default_monitoring_server() -> String {
    "https://monitoring.narrow.so".to_string()
}

impl Config {
    /// Load configuration.
    ///
    /// With an explicit path the file must exist; otherwise
    /// `narrow.toml` in the working directory is used when present, and
    /// defaults apply when it is not.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
