use super::config::SupervisorConfig;
use super::heartbeat;
use super::log_buffer::LogBuffer;
use super::process::ProcessSupervisor;
use super::protocol::Params;
use super::state::{ConnectionState, ConnectionStateMachine};
use super::transport::RpcTransport;
use crate::error::{Result, SdkError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Daemon status probe used by `launch()` and the heartbeat
pub(crate) const PROBE_METHOD: &str = "status";

/// What a `launch()` call ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// State was neither Disconnected nor Terminated; nothing was done
    AlreadyActive(ConnectionState),
    /// A daemon was already answering; nothing was spawned
    Reachable,
    /// A daemon subprocess was started
    Spawned { pid: Option<u32> },
    /// The state moved on (terminate, or the heartbeat saw the daemon come up)
    /// while the probe was in flight; nothing was spawned
    Superseded(ConnectionState),
}

/// Everything the heartbeat task and the public handle share
pub(crate) struct Core {
    pub(crate) state: ConnectionStateMachine,
    pub(crate) transport: RpcTransport,
    pub(crate) process: ProcessSupervisor,
    pub(crate) auto_restart: bool,
}

impl Core {
    pub(crate) fn new(config: &SupervisorConfig) -> Result<Self> {
        let state = ConnectionStateMachine::new();
        let transport = RpcTransport::new(&config.rpc_host, config.rpc_port, state.clone())?;
        let process = ProcessSupervisor::new(
            config.executable_candidates.clone(),
            state.clone(),
            Arc::new(LogBuffer::new(config.output_buffer_lines)),
        );

        Ok(Self {
            state,
            transport,
            process,
            auto_restart: config.auto_restart,
        })
    }

    pub(crate) async fn probe(&self) -> Result<Params> {
        self.transport.request(PROBE_METHOD, Params::new()).await
    }

    pub(crate) async fn launch(&self) -> Result<LaunchOutcome> {
        if !self.state.begin_launch() {
            let current = self.state.current();
            debug!(state = %current, "Launch skipped");
            return Ok(LaunchOutcome::AlreadyActive(current));
        }

        info!("Launching daemon");
        match self.probe().await {
            Ok(_) => {
                info!("Daemon already reachable");
                Ok(LaunchOutcome::Reachable)
            }
            Err(probe_err) => {
                debug!(error = %probe_err, "Daemon not reachable, spawning");
                match self.process.spawn().await {
                    Ok(pid) => Ok(LaunchOutcome::Spawned { pid }),
                    Err(SdkError::LaunchSuperseded(current)) => {
                        Ok(LaunchOutcome::Superseded(current))
                    }
                    Err(e) => {
                        self.state.disconnect();
                        Err(e)
                    }
                }
            }
        }
    }

    pub(crate) async fn terminate(&self) -> bool {
        if !self.state.terminate() {
            debug!("Already terminated");
            return false;
        }
        self.process.stop().await;
        true
    }
}

/// Supervisor for one local daemon: owns the connection state, the heartbeat
/// task, and any daemon subprocess it launched.
///
/// The heartbeat task starts as soon as the supervisor is constructed and
/// stops when the supervisor is shut down or dropped.
pub struct Supervisor {
    core: Arc<Core>,
    heartbeat: JoinHandle<()>,
}

impl Supervisor {
    /// Must be called from within a Tokio runtime.
    pub fn start(config: SupervisorConfig) -> Result<Self> {
        let core = Arc::new(Core::new(&config)?);
        info!(
            endpoint = %core.transport.endpoint(),
            auto_restart = config.auto_restart,
            "Supervisor started"
        );
        let heartbeat = heartbeat::spawn(Arc::clone(&core), config.heartbeat_interval);
        Ok(Self { core, heartbeat })
    }

    pub fn state(&self) -> ConnectionState {
        self.core.state.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.core.state.subscribe()
    }

    /// Wait until the state equals `target`. Returns false on timeout.
    pub async fn wait_for(&self, target: ConnectionState, timeout: Duration) -> bool {
        self.wait_for_any(&[target], timeout).await.is_some()
    }

    /// Wait until the state is one of `targets` and return it, or `None` on timeout.
    pub async fn wait_for_any(
        &self,
        targets: &[ConnectionState],
        timeout: Duration,
    ) -> Option<ConnectionState> {
        let mut rx = self.subscribe();
        let reached = tokio::time::timeout(timeout, rx.wait_for(|s| targets.contains(s)))
            .await
            .ok()?
            .ok()
            .map(|state| *state);
        reached
    }

    /// Start (or adopt) the daemon. Only acts from Disconnected or Terminated.
    pub async fn launch(&self) -> Result<LaunchOutcome> {
        self.core.launch().await
    }

    /// Enter Terminated and stop the daemon subprocess if this supervisor owns one.
    /// Returns false if already terminated.
    pub async fn terminate(&self) -> bool {
        self.core.terminate().await
    }

    /// Call an RPC method and return its `result` object.
    pub async fn request(&self, method: &str, params: Params) -> Result<Params> {
        self.core.transport.request(method, params).await
    }

    pub fn endpoint(&self) -> &str {
        self.core.transport.endpoint()
    }

    pub async fn owned_pid(&self) -> Option<u32> {
        self.core.process.owned_pid().await
    }

    /// Last `n` lines the owned daemon wrote to stdout/stderr.
    pub fn recent_output(&self, n: usize) -> Vec<String> {
        self.core.process.log_buffer().tail(n)
    }

    /// Terminate and stop the heartbeat.
    pub async fn shutdown(self) {
        self.core.terminate().await;
        info!("Supervisor shut down");
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.heartbeat.abort();
    }
}
