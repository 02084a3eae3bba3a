//! Supervisor for a local lbrynet daemon
//!
//! Handles:
//! - Locating and launching the daemon executable
//! - Heartbeat probing and automatic relaunch
//! - Publishing the connection state to subscribers
//! - JSON RPC calls to the daemon over loopback HTTP
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  Supervisor                   │
//! ├──────────────────────────────────────────────┤
//! │  Heartbeat  │  ConnectionStateMachine (watch) │
//! ├──────────────────────────────────────────────┤
//! │  RpcTransport (HTTP)  │  ProcessSupervisor    │
//! ├──────────────────────────────────────────────┤
//! │       lbrynet daemon (localhost:5279)         │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
mod heartbeat;
pub mod log_buffer;
pub mod process;
pub mod protocol;
pub mod state;
pub mod supervisor;
pub mod transport;

pub use config::SupervisorConfig;
pub use protocol::Params;
pub use state::{ConnectionState, ConnectionStateMachine};
pub use supervisor::{LaunchOutcome, Supervisor};
pub use transport::RpcTransport;
