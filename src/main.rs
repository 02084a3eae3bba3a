mod args;
mod commands;

use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Status { launch } => commands::rpc::cmd_status(&cli, *launch).await?,
        Commands::Version { launch } => commands::rpc::cmd_version(&cli, *launch).await?,
        Commands::Call {
            method,
            params,
            launch,
        } => commands::rpc::cmd_call(&cli, method, params, *launch).await?,
        Commands::Resolve { urls, launch } => {
            commands::rpc::cmd_resolve(&cli, urls, *launch).await?
        }
        Commands::Get { uri, launch } => commands::rpc::cmd_get(&cli, uri, *launch).await?,
        Commands::Watch { terminate_on_exit } => {
            commands::watch::cmd_watch(&cli, *terminate_on_exit).await?
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
