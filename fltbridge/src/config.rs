/*!
Configuration management for the bridge application.
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shared::protocol::{DEFAULT_PORT, DEFAULT_UPDATE_RATE_HZ};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bridge: BridgeConfig,
    pub source: SourceConfig,
}

impl AppConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }
}

/// Output side of the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Receiver addresses, `host` or `host:port`
    pub destinations: Vec<String>,

    /// Port used for destinations that don't name one
    pub port: u16,

    /// Ticks per second
    pub update_rate_hz: u32,

    /// Local address the send socket binds to
    pub bind_addr: String,

    /// Allow broadcast destinations such as 255.255.255.255
    pub enable_broadcast: bool,

    /// Statistics reporting interval in seconds (0 disables)
    pub stats_interval_seconds: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            destinations: Vec::new(),
            port: DEFAULT_PORT,
            update_rate_hz: DEFAULT_UPDATE_RATE_HZ,
            bind_addr: "0.0.0.0".to_string(),
            enable_broadcast: false,
            stats_interval_seconds: 30,
        }
    }
}

/// Which telemetry source to connect to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Built-in orbiting aircraft
    #[default]
    Synthetic,
    /// JSON Lines recording
    Replay,
}

/// Telemetry source configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,

    /// Recording to play back when `kind = "replay"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_file: Option<String>,

    /// Synthetic only: every Nth read returns junk (0 = never)
    pub glitch_every: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_roundtrip() {
        let mut original_config = AppConfig::new();
        original_config.bridge.destinations = vec!["192.168.1.20".to_string()];
        original_config.source.kind = SourceKind::Replay;
        original_config.source.replay_file = Some("flight.jsonl".to_string());

        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path();

        // Save and load
        original_config.save_to_file(temp_path).unwrap();
        let loaded_config = AppConfig::load_from_file(temp_path).unwrap();

        assert_eq!(original_config, loaded_config);
        assert_ne!(loaded_config, AppConfig::new());
    }

    #[test]
    fn test_default_values() {
        let config = AppConfig::new();

        assert!(config.bridge.destinations.is_empty());
        assert_eq!(config.bridge.port, 49002);
        assert_eq!(config.bridge.update_rate_hz, 5);
        assert_eq!(config.bridge.bind_addr, "0.0.0.0");
        assert!(!config.bridge.enable_broadcast);

        assert_eq!(config.source.kind, SourceKind::Synthetic);
        assert!(config.source.replay_file.is_none());
        assert_eq!(config.source.glitch_every, 0);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str(
            "[bridge]\ndestinations = [\"10.0.0.5:49003\"]\n\n[source]\nkind = \"replay\"\n",
        )
        .unwrap();

        assert_eq!(config.bridge.destinations, vec!["10.0.0.5:49003"]);
        assert_eq!(config.bridge.update_rate_hz, 5);
        assert_eq!(config.source.kind, SourceKind::Replay);
    }
}
