//! Exporter configuration structs and defaults.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Key of the host entry used when a target has no entry of its own
pub const DEFAULT_HOST_KEY: &str = "default";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    #[serde(default)]
    pub exporter: ExporterSettings,
    #[serde(default)]
    pub redfish: RedfishSettings,
    #[serde(default)]
    pub hosts: HashMap<String, HostConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterSettings {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedfishSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,          // per-request transport timeout
    #[serde(default)]
    pub verify_tls: bool,           // BMCs ship self-signed certificates
}

/// Credentials for one BMC (or for every BMC, under the `default` key)
#[derive(Clone, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,             // "https" | "http"
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub fn default_listen_address() -> String { "0.0.0.0:9347".to_string() }
pub fn default_log_level() -> String { "INFO".to_string() }
pub fn default_timeout_secs() -> f64 { 10.0 }
pub fn default_scheme() -> String { "https".to_string() }

impl Default for ExporterSettings {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            log_level: default_log_level(),
        }
    }
}

impl Default for RedfishSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            verify_tls: false,
        }
    }
}

// Keep passwords out of debug logs
impl std::fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostConfig")
            .field("scheme", &self.scheme)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ExporterConfig {
    /// Credentials for a scrape target: exact match, then the bare host without
    /// its port, then the `default` entry.
    pub fn host_for(&self, target: &str) -> Option<&HostConfig> {
        let bare_host = target
            .rsplit_once(':')
            .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
            .map(|(host, _)| host);

        self.hosts
            .get(target)
            .or_else(|| bare_host.and_then(|h| self.hosts.get(h)))
            .or_else(|| self.hosts.get(DEFAULT_HOST_KEY))
    }
}
