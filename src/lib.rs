pub mod api;
pub mod clienv;
pub mod daemon;
pub mod error;
pub mod user_config;

pub use daemon::{ConnectionState, LaunchOutcome, Params, Supervisor, SupervisorConfig};
pub use error::{Result, SdkError};
