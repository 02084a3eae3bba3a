use std::path::PathBuf;
use std::time::Duration;

use crate::user_config::UserConfig;

const CONFIG_DIR_VAR: &str = "LBRYNET_SUPERVISOR_CONFIG_DIR";
const RPC_PORT_VAR: &str = "LBRYNET_RPC_PORT";
const HEARTBEAT_MS_VAR: &str = "LBRYNET_HEARTBEAT_MS";
const AUTO_RESTART_VAR: &str = "LBRYNET_AUTO_RESTART";

const FALLBACK_CONFIG_DIR: &str = "~/.config";
const SUPERVISOR_SUBDIR: &str = "lbrynet-supervisor";

pub const DEFAULT_RPC_HOST: &str = "localhost";
pub const DEFAULT_RPC_PORT: u16 = 5279;
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub(crate) fn is_falsy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// Config directory ($LBRYNET_SUPERVISOR_CONFIG_DIR or ~/.config/lbrynet-supervisor)
pub fn config_dir() -> PathBuf {
    let dir = env_opt(CONFIG_DIR_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from(FALLBACK_CONFIG_DIR))
                .join(SUPERVISOR_SUBDIR)
        });
    tracing::trace!(dir = %dir.display(), "Resolved config directory");
    dir
}

/// RPC port (env var > config > 5279)
pub fn rpc_port(config: &UserConfig) -> u16 {
    if let Some(port) = env_opt(RPC_PORT_VAR).and_then(|s| s.parse().ok()) {
        tracing::trace!(port, "RPC port from {}", RPC_PORT_VAR);
        return port;
    }
    config.rpc_port.unwrap_or(DEFAULT_RPC_PORT)
}

/// Heartbeat period (env var in milliseconds > config > 5s)
pub fn heartbeat_interval(config: &UserConfig) -> Duration {
    let millis = env_opt(HEARTBEAT_MS_VAR)
        .and_then(|s| s.parse::<u64>().ok())
        .or(config.heartbeat_interval_ms)
        .filter(|ms| *ms > 0);
    let interval = millis
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL);
    tracing::trace!(interval = ?interval, "Heartbeat interval");
    interval
}

/// Whether a lost daemon is relaunched by the heartbeat (env var > config > true)
pub fn auto_restart(config: &UserConfig) -> bool {
    if let Some(val) = env_opt(AUTO_RESTART_VAR) {
        if is_falsy(&val) {
            tracing::trace!("Auto-restart disabled by {}", AUTO_RESTART_VAR);
            return false;
        }
        if is_truthy(&val) {
            return true;
        }
        tracing::warn!(value = %val, "Ignoring unrecognised {}", AUTO_RESTART_VAR);
    }
    config.auto_restart.unwrap_or(true)
}
