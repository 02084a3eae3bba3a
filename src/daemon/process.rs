use super::log_buffer::LogBuffer;
use super::state::{ConnectionState, ConnectionStateMachine};
use crate::error::{Result, SdkError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, error, info, warn};

/// Arguments the daemon is always started with
pub const DAEMON_ARGS: &[&str] = &["start"];

/// Prefix for forwarded daemon output
pub const OUTPUT_TAG: &str = "[lbrynet]";

const STOP_TIMEOUT: Duration = Duration::from_secs(10);

type StopAck = oneshot::Sender<()>;

/// The daemon process this supervisor launched itself
struct TrackedProcess {
    pid: Option<u32>,
    generation: u64,
    stop_tx: oneshot::Sender<StopAck>,
}

/// Locates, spawns, and watches the daemon subprocess. At most one is tracked.
pub struct ProcessSupervisor {
    candidates: Vec<PathBuf>,
    tracked: Arc<Mutex<Option<TrackedProcess>>>,
    generation: AtomicU64,
    state: ConnectionStateMachine,
    log_buffer: Arc<LogBuffer>,
}

impl ProcessSupervisor {
    pub fn new(
        candidates: Vec<PathBuf>,
        state: ConnectionStateMachine,
        log_buffer: Arc<LogBuffer>,
    ) -> Self {
        Self {
            candidates,
            tracked: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
            state,
            log_buffer,
        }
    }

    pub fn log_buffer(&self) -> &Arc<LogBuffer> {
        &self.log_buffer
    }

    /// Spawn the daemon and return its PID without waiting for it to answer.
    ///
    /// Only spawns while the state is Connecting. The check runs under the
    /// same lock `stop()` takes, so a concurrent terminate either prevents the
    /// spawn or reaps the new process.
    pub async fn spawn(&self) -> Result<Option<u32>> {
        let mut tracked = self.tracked.lock().await;

        if let Some(existing) = tracked.as_ref() {
            warn!(pid = ?existing.pid, "Refusing to spawn a second daemon");
            return Err(SdkError::SubprocessStateInconsistent);
        }

        let current = self.state.current();
        if current != ConnectionState::Connecting {
            info!(state = %current, "Launch superseded, not spawning");
            return Err(SdkError::LaunchSuperseded(current));
        }

        let path = find_executable(&self.candidates)
            .ok_or_else(|| SdkError::ExecutableNotFound {
                searched: self.candidates.clone(),
            })?
            .to_path_buf();

        let mut cmd = Command::new(&path);
        cmd.args(DAEMON_ARGS);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to start daemon");
                self.state.disconnect();
                return Err(SdkError::LaunchFailed { path, source: e });
            }
        };

        let pid = child.id();
        info!(pid = ?pid, path = %path.display(), "Started daemon");

        self.log_buffer.clear();

        spawn_log_readers(&mut child, &self.log_buffer);

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (stop_tx, stop_rx) = oneshot::channel();
        *tracked = Some(TrackedProcess {
            pid,
            generation,
            stop_tx,
        });

        tokio::spawn(watch_process(
            child,
            stop_rx,
            generation,
            Arc::clone(&self.tracked),
            self.state.clone(),
        ));

        Ok(pid)
    }

    /// Stop the tracked daemon, if any, and wait for it to go away.
    ///
    /// A daemon stopped this way does not move the connection state.
    pub async fn stop(&self) -> bool {
        let Some(process) = self.tracked.lock().await.take() else {
            return false;
        };

        info!(pid = ?process.pid, "Stopping daemon");
        let (ack_tx, ack_rx) = oneshot::channel();
        if process.stop_tx.send(ack_tx).is_ok() {
            // Err means the watcher already finished
            let _ = ack_rx.await;
        }
        true
    }

    pub async fn owned_pid(&self) -> Option<u32> {
        self.tracked.lock().await.as_ref().and_then(|p| p.pid)
    }

    pub async fn is_tracking(&self) -> bool {
        self.tracked.lock().await.is_some()
    }
}

/// First candidate that exists and is executable.
pub fn find_executable(candidates: &[PathBuf]) -> Option<&Path> {
    let found = candidates
        .iter()
        .map(PathBuf::as_path)
        .find(|path| is_executable(path));
    debug!(found = ?found, searched = candidates.len(), "Daemon executable lookup");
    found
}

fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}

/// Wait for either the daemon's own exit or a stop request.
async fn watch_process(
    mut child: Child,
    mut stop_rx: oneshot::Receiver<StopAck>,
    generation: u64,
    tracked: Arc<Mutex<Option<TrackedProcess>>>,
    state: ConnectionStateMachine,
) {
    tokio::select! {
        status = child.wait() => {
            match status {
                Ok(status) => warn!(status = %status, "Daemon exited"),
                Err(e) => error!(error = %e, "Failed to wait on daemon"),
            }

            let mut tracked = tracked.lock().await;
            if tracked.as_ref().is_some_and(|p| p.generation == generation) {
                *tracked = None;
                drop(tracked);
                state.disconnect();
            }
        }
        request = &mut stop_rx => {
            stop_child(&mut child).await;
            if let Ok(ack) = request {
                let _ = ack.send(());
            }
        }
    }
}

/// SIGTERM, bounded wait, then SIGKILL.
async fn stop_child(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            unsafe {
                libc::kill(pid as i32, libc::SIGTERM);
            }
        }

        match tokio::time::timeout(STOP_TIMEOUT, child.wait()).await {
            Ok(_) => {
                debug!("Daemon stopped gracefully");
                return;
            }
            Err(_) => warn!("Daemon did not stop in time, force killing"),
        }
    }

    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill daemon");
    }
}

/// Drain stdout/stderr into the log sink and the ring buffer until EOF.
fn spawn_log_readers(child: &mut Child, log_buffer: &Arc<LogBuffer>) {
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(drain_output(stdout, "stdout", Arc::clone(log_buffer)));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(drain_output(stderr, "stderr", Arc::clone(log_buffer)));
    }
}

async fn drain_output<R>(stream: R, name: &'static str, log_buffer: Arc<LogBuffer>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut chunk = Vec::new();

    loop {
        chunk.clear();
        match reader.read_until(b'\n', &mut chunk).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&chunk).trim_end().to_string();
                info!(target: "lbrynet", stream = name, "{} {}", OUTPUT_TAG, line);
                log_buffer.push(line);
            }
            Err(e) => {
                debug!(stream = name, error = %e, "Daemon output read failed");
                break;
            }
        }
    }

    debug!(stream = name, "Daemon output closed");
}
