use super::state::ConnectionState;
use super::supervisor::Core;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Spawn the heartbeat loop. The first tick runs immediately.
///
/// The loop keeps ticking in every state, Terminated included; it only ends
/// when the returned handle is aborted.
pub(crate) fn spawn(core: Arc<Core>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Heartbeat started (interval: {:?})", interval);
        loop {
            tick(&core).await;
            tokio::time::sleep(interval).await;
        }
    })
}

/// One heartbeat: probe and/or relaunch depending on the current state.
pub(crate) async fn tick(core: &Core) {
    match core.state.current() {
        ConnectionState::Connected => match core.probe().await {
            Ok(_) => debug!("Daemon is healthy"),
            Err(e) => {
                warn!(error = %e, "Lost connection to daemon");
                core.state.lose_connection();
            }
        },
        ConnectionState::Connecting => match core.probe().await {
            Ok(_) => {
                core.state
                    .transition(&[ConnectionState::Connecting], ConnectionState::Connected);
            }
            Err(e) => debug!(error = %e, "Daemon not answering yet"),
        },
        ConnectionState::Disconnected => {
            if core.auto_restart {
                if let Err(e) = core.launch().await {
                    warn!(error = %e, "Automatic daemon launch failed");
                }
            }
        }
        ConnectionState::Terminated => {}
    }
}
