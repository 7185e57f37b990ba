use crate::constants::{
    DEFAULT_NODE_TTL_S, DEFAULT_OWNER_ADDRESS, DEFAULT_OWNER_PORT, DEFAULT_SWEEP_INTERVAL_S,
    FETCH_TIMEOUT_MILLISECONDS,
};
use crate::core::node_record::NodeLocation;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the controller obtains replica bytes on download.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Content is not stored anywhere; a fixed placeholder is returned.
    #[default]
    Placeholder,
    /// Bytes are requested from the selected owner over TCP.
    Tcp,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub default_owner_address: String,
    pub default_owner_port: u16,
    pub node_ttl_s: u64,
    pub sweep_interval_s: u64,
    pub fetch_mode: FetchMode,
    pub fetch_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_owner_address: DEFAULT_OWNER_ADDRESS.to_string(),
            default_owner_port: DEFAULT_OWNER_PORT,
            node_ttl_s: DEFAULT_NODE_TTL_S,
            sweep_interval_s: DEFAULT_SWEEP_INTERVAL_S,
            fetch_mode: FetchMode::default(),
            fetch_timeout_ms: FETCH_TIMEOUT_MILLISECONDS,
        }
    }
}

impl Config {
    pub fn parse_from_file(file_path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file '{}'", file_path))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", file_path))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_owner_address.is_empty() {
            anyhow::bail!("default_owner_address must not be empty");
        }
        if self.default_owner_port == 0 {
            anyhow::bail!("default_owner_port must be in 1..=65535");
        }
        if self.sweep_interval_s == 0 {
            anyhow::bail!("sweep_interval_s must be greater than zero");
        }
        Ok(())
    }

    pub fn default_owner_location(&self) -> NodeLocation {
        NodeLocation::new(self.default_owner_address.clone(), self.default_owner_port)
    }

    pub fn node_ttl(&self) -> Duration {
        Duration::from_secs(self.node_ttl_s)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_s)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
