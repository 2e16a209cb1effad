//! Configuration loading

use anyhow::Result;
use fluxlink_discovery::DiscoveryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Seconds to wait for a device announcement; 0 waits forever
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_secs: default_lookup_timeout(),
        }
    }
}

impl ClientConfig {
    pub fn lookup_timeout(&self) -> Option<Duration> {
        match self.lookup_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn default_lookup_timeout() -> u64 {
    10
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.discovery, DiscoveryConfig::default());
        assert_eq!(config.client.lookup_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fluxlink.toml");
        std::fs::write(
            &path,
            "[discovery]\nport = 3310\n\n[client]\nlookup_timeout_secs = 0\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.discovery.port, 3310);
        assert_eq!(config.discovery.probe_interval_ms, 1000);
        assert_eq!(config.client.lookup_timeout(), None);
    }

    #[test]
    fn test_saved_default_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fluxlink.toml");
        save_default_config(&path).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.discovery, DiscoveryConfig::default());
        assert_eq!(config.client.lookup_timeout_secs, 10);
    }
}
