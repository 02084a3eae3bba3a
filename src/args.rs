use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lbrynet-supervisor")]
#[command(version)]
#[command(about = "Launch, watch, and talk to a local lbrynet daemon", long_about = None)]
pub(crate) struct Cli {
    /// RPC port of the daemon. Can also be set via LBRYNET_RPC_PORT.
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Do not relaunch the daemon when it goes away (used by `watch`)
    #[arg(long, global = true)]
    pub no_auto_restart: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args, Clone, Copy)]
pub(crate) struct LaunchArgs {
    /// Launch the daemon (if needed) and wait for it before calling
    #[arg(long)]
    pub launch: bool,

    /// Seconds to wait for the daemon to come up
    #[arg(long, default_value = "60")]
    pub timeout: u64,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Show the daemon's status
    Status {
        #[command(flatten)]
        launch: LaunchArgs,
    },

    /// Show the daemon's version
    Version {
        #[command(flatten)]
        launch: LaunchArgs,
    },

    /// Call any RPC method
    Call {
        /// Method name (e.g., "status", "claim_search")
        method: String,

        /// Parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,

        #[command(flatten)]
        launch: LaunchArgs,
    },

    /// Resolve one or more URLs
    Resolve {
        #[arg(required = true)]
        urls: Vec<String>,

        #[command(flatten)]
        launch: LaunchArgs,
    },

    /// Fetch a stream and print its streaming URL
    Get {
        uri: String,

        #[command(flatten)]
        launch: LaunchArgs,
    },

    /// Launch the daemon and print connection state changes until Ctrl+C
    Watch {
        /// Stop the daemon on exit if this process started it
        #[arg(long)]
        terminate_on_exit: bool,
    },
}
