use super::log_buffer::DEFAULT_MAX_LINES;
use crate::clienv;
use crate::user_config::UserConfig;
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(target_os = "linux")]
const EXECUTABLE_CANDIDATES: &[&str] = &[
    "/opt/LBRY/resources/static/daemon/lbrynet",
    "/usr/local/bin/lbrynet",
    "/usr/bin/lbrynet",
];

#[cfg(target_os = "macos")]
const EXECUTABLE_CANDIDATES: &[&str] = &[
    "/Applications/LBRY.app/Contents/Resources/static/daemon/lbrynet",
    "/opt/homebrew/bin/lbrynet",
    "/usr/local/bin/lbrynet",
];

#[cfg(target_os = "windows")]
const EXECUTABLE_CANDIDATES: &[&str] = &[
    r"C:\Program Files\LBRY\resources\static\daemon\lbrynet.exe",
    r"C:\Program Files (x86)\LBRY\resources\static\daemon\lbrynet.exe",
];

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const EXECUTABLE_CANDIDATES: &[&str] = &["/usr/local/bin/lbrynet"];

/// Well-known install locations, in priority order
pub fn default_candidates() -> Vec<PathBuf> {
    EXECUTABLE_CANDIDATES.iter().map(PathBuf::from).collect()
}

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub rpc_host: String,
    pub rpc_port: u16,
    pub heartbeat_interval: Duration,
    pub auto_restart: bool,
    pub executable_candidates: Vec<PathBuf>,
    /// Capacity of the daemon output ring buffer
    pub output_buffer_lines: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            rpc_host: clienv::DEFAULT_RPC_HOST.to_string(),
            rpc_port: clienv::DEFAULT_RPC_PORT,
            heartbeat_interval: clienv::DEFAULT_HEARTBEAT_INTERVAL,
            auto_restart: true,
            executable_candidates: default_candidates(),
            output_buffer_lines: DEFAULT_MAX_LINES,
        }
    }
}

impl SupervisorConfig {
    /// Resolve tunables from the environment and the user config file.
    pub fn load() -> Result<Self> {
        let user = UserConfig::load()?;
        Ok(Self::from_user_config(&user))
    }

    pub fn from_user_config(user: &UserConfig) -> Self {
        Self {
            rpc_port: clienv::rpc_port(user),
            heartbeat_interval: clienv::heartbeat_interval(user),
            auto_restart: clienv::auto_restart(user),
            ..Self::default()
        }
    }

    pub fn with_rpc_host(mut self, host: impl Into<String>) -> Self {
        self.rpc_host = host.into();
        self
    }

    pub fn with_rpc_port(mut self, port: u16) -> Self {
        self.rpc_port = port;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_auto_restart(mut self, enabled: bool) -> Self {
        self.auto_restart = enabled;
        self
    }

    /// Replace the executable search list (e.g. for a bundled daemon).
    pub fn with_candidates(mut self, candidates: Vec<PathBuf>) -> Self {
        self.executable_candidates = candidates;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SupervisorConfig::default();
        assert_eq!(config.rpc_host, "localhost");
        assert_eq!(config.rpc_port, 5279);
        assert!(config.auto_restart);
        assert_eq!(config.executable_candidates, default_candidates());
        assert!(!config.executable_candidates.is_empty());
    }

    #[test]
    fn test_user_config_does_not_touch_candidates() {
        let user = UserConfig {
            rpc_port: Some(1234),
            heartbeat_interval_ms: Some(100),
            auto_restart: Some(false),
        };
        let config = SupervisorConfig::from_user_config(&user);
        assert_eq!(config.executable_candidates, default_candidates());
    }

    #[test]
    fn test_builder() {
        let config = SupervisorConfig::default()
            .with_rpc_host("127.0.0.1")
            .with_rpc_port(15279)
            .with_heartbeat_interval(Duration::from_millis(20))
            .with_auto_restart(false)
            .with_candidates(vec![PathBuf::from("/tmp/lbrynet")]);

        assert_eq!(config.rpc_host, "127.0.0.1");
        assert_eq!(config.rpc_port, 15279);
        assert_eq!(config.heartbeat_interval, Duration::from_millis(20));
        assert!(!config.auto_restart);
        assert_eq!(config.executable_candidates, vec![PathBuf::from("/tmp/lbrynet")]);
    }
}
