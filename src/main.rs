use std::path::PathBuf;

use clap::Parser;
use docshare_lib::bootstrap::{build_runtime, init_tracing_subscriber, resolve_config};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "docshare")]
#[command(version, about = "Watch attached devices and serve the DocShare runtime")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "DOCSHARE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = resolve_config(args.config)?;
    init_tracing_subscriber(&config.log_dir)?;

    info!(log_dir = %config.log_dir.display(), "docshare starting");
    let (runtime, handle) = build_runtime(&config);
    let runtime_task = tokio::spawn(runtime.run());

    let mut snapshots = handle.subscribe();
    let mut known: Vec<String> = Vec::new();
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!("runtime stopped publishing state");
                    break;
                }
                let names: Vec<String> = snapshots
                    .borrow_and_update()
                    .devices
                    .iter()
                    .map(|d| format!("{} ({})", d.name, d.id))
                    .collect();
                if names != known {
                    info!(devices = ?names, "attached devices changed");
                    known = names;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    if let Err(e) = handle.shutdown().await {
        warn!(error = %e, "runtime already stopped");
    }
    if let Err(e) = runtime_task.await {
        error!(error = %e, "runtime task failed");
    }
    Ok(())
}
