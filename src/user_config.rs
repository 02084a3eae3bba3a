use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UserConfig {
    /// Port the daemon serves RPC on
    pub rpc_port: Option<u16>,
    /// Heartbeat period in milliseconds
    pub heartbeat_interval_ms: Option<u64>,
    /// Relaunch the daemon when the heartbeat finds it gone
    pub auto_restart: Option<bool>,
}

impl UserConfig {
    /// $LBRYNET_SUPERVISOR_CONFIG_DIR/config.toml or ~/.config/lbrynet-supervisor/config.toml
    pub fn config_path() -> PathBuf {
        crate::clienv::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::trace!(path = %path.display(), "Loading user config");

        if !path.exists() {
            tracing::trace!("Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        tracing::trace!(
            rpc_port = ?config.rpc_port,
            heartbeat_interval_ms = ?config.heartbeat_interval_ms,
            auto_restart = ?config.auto_restart,
            "User config loaded"
        );
        Ok(config)
    }
}
