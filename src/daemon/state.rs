use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Connection state of the supervised daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Nothing is answering and no launch is in progress
    Disconnected,
    /// A launch happened; waiting for the first successful probe
    Connecting,
    /// The last probe succeeded
    Connected,
    /// Explicitly terminated; the heartbeat will not relaunch
    Terminated,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared connection state, published through a watch channel.
///
/// Every write goes through `send_if_modified`, which runs the closure under the
/// channel's write lock, so each transition is a compare-and-swap.
#[derive(Clone)]
pub struct ConnectionStateMachine {
    tx: Arc<watch::Sender<ConnectionState>>,
}

impl ConnectionStateMachine {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Disconnected);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// Subscribers immediately observe the current value.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    /// Move to `to` only if the current state is one of `from`.
    ///
    /// Returns whether the guard matched. Subscribers are notified only when
    /// the value actually changed.
    pub fn transition(&self, from: &[ConnectionState], to: ConnectionState) -> bool {
        let mut matched = false;
        let mut previous = to;
        self.tx.send_if_modified(|state| {
            if !from.contains(state) {
                return false;
            }
            matched = true;
            previous = *state;
            *state = to;
            previous != to
        });
        if matched && previous != to {
            info!(from = %previous, to = %to, "Connection state changed");
        }
        matched
    }

    /// `launch()` guard: Disconnected | Terminated -> Connecting.
    pub fn begin_launch(&self) -> bool {
        self.transition(
            &[ConnectionState::Disconnected, ConnectionState::Terminated],
            ConnectionState::Connecting,
        )
    }

    /// Connecting | Connected -> Disconnected. Never overrides Terminated.
    pub fn disconnect(&self) -> bool {
        self.transition(
            &[ConnectionState::Connecting, ConnectionState::Connected],
            ConnectionState::Disconnected,
        )
    }

    /// Connected -> Disconnected, for a failed round-trip.
    pub fn lose_connection(&self) -> bool {
        self.transition(&[ConnectionState::Connected], ConnectionState::Disconnected)
    }

    /// Any -> Terminated. Returns false if already terminated.
    pub fn terminate(&self) -> bool {
        self.transition(
            &[
                ConnectionState::Disconnected,
                ConnectionState::Connecting,
                ConnectionState::Connected,
            ],
            ConnectionState::Terminated,
        )
    }
}

impl Default for ConnectionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
