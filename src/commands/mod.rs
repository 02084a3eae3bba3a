pub(crate) mod rpc;
pub(crate) mod watch;

use crate::args::{Cli, LaunchArgs};
use anyhow::{bail, Context, Result};
use lbrynet_supervisor::{ConnectionState, SdkError, Supervisor, SupervisorConfig};
use std::time::Duration;

/// Build a supervisor from env/config, with CLI flags on top.
///
/// One-shot commands pass `false`: their own `launch()` is the only one, so
/// its errors reach the user instead of the heartbeat's log.
pub(crate) fn supervisor(cli: &Cli, auto_restart: bool) -> Result<Supervisor> {
    let mut config = SupervisorConfig::load().context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config = config.with_rpc_port(port);
    }
    let auto_restart = auto_restart && config.auto_restart && !cli.no_auto_restart;
    config = config.with_auto_restart(auto_restart);

    Supervisor::start(config).context("Failed to start supervisor")
}

/// Launch the daemon if requested and wait until it answers.
pub(crate) async fn prepare(supervisor: &Supervisor, args: LaunchArgs) -> Result<()> {
    if !args.launch {
        return Ok(());
    }

    let outcome = supervisor.launch().await?;
    tracing::debug!(outcome = ?outcome, "Launch finished");

    let timeout = Duration::from_secs(args.timeout);
    let reached = supervisor
        .wait_for_any(
            &[
                ConnectionState::Connected,
                ConnectionState::Disconnected,
                ConnectionState::Terminated,
            ],
            timeout,
        )
        .await;

    match reached {
        Some(ConnectionState::Connected) => Ok(()),
        Some(state) => {
            print_recent_output(supervisor);
            bail!("Daemon became {} before answering at {}", state, supervisor.endpoint())
        }
        None => {
            print_recent_output(supervisor);
            bail!(
                "Daemon did not become reachable at {} within {}s",
                supervisor.endpoint(),
                args.timeout
            )
        }
    }
}

fn print_recent_output(supervisor: &Supervisor) {
    for line in supervisor.recent_output(20) {
        eprintln!("  {}", line);
    }
}

/// Point at `--launch` when nothing is listening.
pub(crate) fn rpc_error(err: SdkError) -> anyhow::Error {
    if err.is_unreachable() {
        anyhow::Error::new(err).context("Daemon is not running (pass --launch to start it)")
    } else {
        err.into()
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Instant;

    fn unused_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn one_shot(candidates: Vec<PathBuf>) -> Supervisor {
        let config = SupervisorConfig::default()
            .with_rpc_host("127.0.0.1")
            .with_rpc_port(unused_port())
            .with_heartbeat_interval(Duration::from_millis(20))
            .with_auto_restart(false)
            .with_candidates(candidates);
        Supervisor::start(config).unwrap()
    }

    fn launching(timeout: u64) -> LaunchArgs {
        LaunchArgs {
            launch: true,
            timeout,
        }
    }

    #[tokio::test]
    async fn test_prepare_reports_missing_executable() {
        let supervisor = one_shot(Vec::new());
        let started = Instant::now();

        let err = prepare(&supervisor, launching(30)).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SdkError>(),
            Some(SdkError::ExecutableNotFound { .. })
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_prepare_stops_waiting_when_daemon_exits() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("lbrynet");
        std::fs::write(&script, "#!/bin/sh\necho \"wallet locked\"\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let supervisor = one_shot(vec![script]);
        let started = Instant::now();

        let err = prepare(&supervisor, launching(30)).await.unwrap_err();
        assert!(err.to_string().contains("disconnected"), "got {err}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_unreachable_error_suggests_launch() {
        let err = rpc_error(SdkError::DaemonNotLaunched {
            endpoint: "http://localhost:5279/".to_string(),
            reason: "connection refused".to_string(),
        });
        assert!(err.to_string().contains("--launch"));
        assert!(err.downcast_ref::<SdkError>().is_some());
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = rpc_error(SdkError::mismatch("version"));
        assert_eq!(err.to_string(), "response mismatch: missing or invalid `version`");
    }
}
