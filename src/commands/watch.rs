use super::supervisor;
use crate::args::Cli;
use anyhow::Result;
use tracing::warn;

pub(crate) async fn cmd_watch(cli: &Cli, terminate_on_exit: bool) -> Result<()> {
    let supervisor = supervisor(cli, true)?;
    let mut states = supervisor.subscribe();

    println!("{} (Ctrl+C to stop)", supervisor.endpoint());
    if let Err(e) = supervisor.launch().await {
        warn!(error = %e, "Initial launch failed; the heartbeat will keep trying");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let state = *states.borrow_and_update();
        println!("{}", state);

        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                println!();
                break;
            }
        }
    }

    if terminate_on_exit {
        supervisor.shutdown().await;
    }
    Ok(())
}
