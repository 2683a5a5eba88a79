//! Config file loading and validation.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use crate::config::types::ExporterConfig;

/// Default config location: `config.json` next to the executable.
pub fn default_config_path() -> Result<PathBuf> {
    let exe_dir = std::env::current_exe()?
        .parent()
        .ok_or_else(|| anyhow!("Cannot determine executable directory"))?
        .to_path_buf();
    Ok(exe_dir.join("config.json"))
}

/// Parse and validate config file contents.
pub fn parse_config(content: &str) -> Result<ExporterConfig> {
    let config: ExporterConfig = serde_json::from_str(content).context("Invalid config JSON")?;

    if config.hosts.is_empty() {
        return Err(anyhow!(
            "Config defines no hosts. Add a \"default\" entry or one entry per BMC under \"hosts\"."
        ));
    }

    for (name, host) in &config.hosts {
        if host.scheme != "https" && host.scheme != "http" {
            return Err(anyhow!("Host '{}' has unsupported scheme '{}'", name, host.scheme));
        }
        if host.username.is_empty() || host.password.is_empty() {
            warn!("Host '{}' has empty credentials; BMC requests will likely be rejected", name);
        }
    }

    if config.redfish.timeout_secs <= 0.0 {
        return Err(anyhow!("redfish.timeout_secs must be positive"));
    }

    Ok(config)
}

pub async fn load_config(path: Option<&str>) -> Result<ExporterConfig> {
    let config_path = match path {
        Some(p) => PathBuf::from(p),
        None => default_config_path()?,
    };

    if !Path::new(&config_path).exists() {
        return Err(anyhow!("Config file not found: {:?}", config_path));
    }

    let content = tokio::fs::read_to_string(&config_path)
        .await
        .with_context(|| format!("Failed to read config: {:?}", config_path))?;
    let config = parse_config(&content).with_context(|| format!("Failed to load {:?}", config_path))?;

    info!("Loaded configuration from: {:?} ({} hosts)", config_path, config.hosts.len());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_defaults_for_missing_sections() {
        let config = parse_config(r#"{"hosts": {"default": {"username": "root", "password": "calvin"}}}"#)
            .unwrap();

        assert_eq!(config.exporter.listen_address, "0.0.0.0:9347");
        assert_eq!(config.exporter.log_level, "INFO");
        assert_eq!(config.redfish.timeout_secs, 10.0);
        assert!(!config.redfish.verify_tls);
        assert_eq!(config.hosts["default"].scheme, "https");
    }

    #[test]
    fn rejects_config_without_hosts() {
        assert!(parse_config(r#"{"exporter": {"listen_address": "127.0.0.1:9000"}}"#).is_err());
    }

    #[test]
    fn rejects_unknown_scheme() {
        let err = parse_config(r#"{"hosts": {"default": {"scheme": "ftp"}}}"#).unwrap_err();
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn rejects_non_positive_timeout() {
        assert!(parse_config(r#"{"redfish": {"timeout_secs": 0}, "hosts": {"default": {}}}"#).is_err());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        assert!(load_config(Some("/nonexistent/oob-gpu-exporter.json")).await.is_err());
    }
}
