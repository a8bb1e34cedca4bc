//! Drive device operations from the command line without the runtime loop.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ds_app::usecases::{ChainFactory, ListApps, RemoteFileClient, ScanDevices};
use ds_core::config::AppConfig;
use ds_core::ids::{AppId, DeviceId};
use ds_core::remote::RemotePath;
use ds_infra::{resolve_config, StdLocalFs};
use ds_platform::UsbmuxTransport;

#[derive(Parser, Debug)]
#[command(name = "ds-probe")]
#[command(version, about = "Inspect attached devices and their app documents")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "DOCSHARE_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List attached devices
    Devices,
    /// List file-sharing apps on a device
    Apps { udid: String },
    /// List a directory inside an app's documents
    Ls {
        udid: String,
        bundle: String,
        #[arg(default_value = "/Documents")]
        path: String,
    },
    /// Copy a remote file or directory into a local directory
    Pull {
        udid: String,
        bundle: String,
        remote: String,
        local: PathBuf,
    },
    /// Copy a local file or directory into a remote directory
    Push {
        udid: String,
        bundle: String,
        local: PathBuf,
        remote: String,
    },
    /// Delete a remote file or directory tree
    Rm {
        udid: String,
        bundle: String,
        remote: String,
    },
}

struct Probe {
    chains: ChainFactory,
    files: RemoteFileClient,
    json: bool,
}

impl Probe {
    fn new(config: &AppConfig, json: bool) -> Self {
        let chains = ChainFactory::new(
            Arc::new(UsbmuxTransport::from_config(config)),
            config.client_label.clone(),
        );
        let files = RemoteFileClient::new(chains.clone(), Arc::new(StdLocalFs::new()));
        Self { chains, files, json }
    }

    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Devices => {
                let devices = ScanDevices::new(self.chains.clone())
                    .execute(Vec::new())
                    .await
                    .context("device enumeration failed")?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&devices)?);
                } else {
                    for device in devices {
                        println!("{}\t{}\t{}", device.id, device.connection, device.name);
                    }
                }
            }
            Command::Apps { udid } => {
                let apps = ListApps::new(self.chains.clone())
                    .execute(&DeviceId::new(udid))
                    .await
                    .context("could not list apps")?;
                for app in apps {
                    println!("{}\t{}\t{}", app.id, app.version, app.name);
                }
            }
            Command::Ls { udid, bundle, path } => {
                let path = RemotePath::new(&path);
                let files = self
                    .files
                    .list_files(&DeviceId::new(udid), &AppId::new(bundle), &path)
                    .await
                    .with_context(|| format!("could not list {path}"))?;
                for file in files {
                    let kind = if file.is_directory { "d" } else { "-" };
                    println!("{kind} {:>12} {}", file.size, file.name);
                }
            }
            Command::Pull { udid, bundle, remote, local } => {
                let source = RemotePath::new(&remote);
                let ok = self
                    .files
                    .download_tree(&DeviceId::new(udid), &AppId::new(bundle), &source, &local)
                    .await;
                if !ok {
                    bail!("download of {source} was incomplete");
                }
                println!("downloaded {source} to {}", local.display());
            }
            Command::Push { udid, bundle, local, remote } => {
                let destination = RemotePath::new(&remote);
                let ok = self
                    .files
                    .upload_tree(&DeviceId::new(udid), &AppId::new(bundle), &local, &destination)
                    .await;
                if !ok {
                    bail!("upload of {} was incomplete", local.display());
                }
                println!("uploaded {} to {destination}", local.display());
            }
            Command::Rm { udid, bundle, remote } => {
                let path = RemotePath::new(&remote);
                let ok = self
                    .files
                    .delete_tree(&DeviceId::new(udid), &AppId::new(bundle), &path)
                    .await;
                if !ok {
                    bail!("could not delete {path}");
                }
                println!("deleted {path}");
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = resolve_config(args.config)?;
    Probe::new(&config, args.json).run(args.command).await
}
