//! Coordinator runtime.
//!
//! [`BrowserRuntime`] is the single owner of all published state: the device
//! list, the browsed app and directory, and the selection. It reacts to three
//! sources in one `select!` loop: commands from [`CoreHandle`]s, the discovery
//! ticker, and outcomes of background tasks. Background tasks never touch the
//! state; they send their results back here.

mod command;
mod handle;
mod state;

use std::future::Future;
use std::time::Duration;

use ds_core::app::App;
use ds_core::config::AppConfig;
use ds_core::device::Device;
use ds_core::ids::{AppId, DeviceId};
use ds_core::remote::{RemoteFile, RemotePath};
use ds_core::selection::{FileItem, SelectionSet};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::deps::AppDeps;
use crate::usecases::{
    BatchOutcome, ChainFactory, ListApps, RemoteFileClient, ScanDevices, TransferEngine,
};
use command::{Reply, TaskOutcome};

pub use command::CoreCommand;
pub use handle::CoreHandle;
pub use state::{BrowserSnapshot, BrowserState};

const COMMAND_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub client_label: String,
    pub scan_interval: Duration,
}

impl RuntimeOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            client_label: config.client_label.clone(),
            scan_interval: Duration::from_secs(config.scan_interval_secs.max(1)),
        }
    }
}

pub struct BrowserRuntime {
    scan: ScanDevices,
    list_apps: ListApps,
    files: RemoteFileClient,
    transfer: TransferEngine,
    state: BrowserState,
    selection: SelectionSet,
    scan_interval: Duration,
    scan_in_flight: bool,
    /// Answered when the in-flight scan settles.
    scan_waiters: Vec<Reply<Vec<Device>>>,
    /// Asked while a scan was already running; served by a fresh scan.
    deferred_waiters: Vec<Reply<Vec<Device>>>,
    command_rx: mpsc::Receiver<CoreCommand>,
    outcome_tx: mpsc::UnboundedSender<TaskOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<TaskOutcome>,
    snapshot_tx: watch::Sender<BrowserSnapshot>,
    shutting_down: bool,
}

impl BrowserRuntime {
    pub fn new(deps: AppDeps, options: RuntimeOptions) -> (Self, CoreHandle) {
        let chains = ChainFactory::new(deps.transport, options.client_label);
        let files = RemoteFileClient::new(chains.clone(), deps.local_fs.clone());
        let transfer = TransferEngine::new(files.clone(), deps.local_fs, deps.notifier);

        let state = BrowserState::default();
        let selection = SelectionSet::new();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) =
            watch::channel(BrowserSnapshot::capture(&state, &selection));

        let runtime = Self {
            scan: ScanDevices::new(chains.clone()),
            list_apps: ListApps::new(chains),
            files,
            transfer,
            state,
            selection,
            scan_interval: options.scan_interval,
            scan_in_flight: false,
            scan_waiters: Vec::new(),
            deferred_waiters: Vec::new(),
            command_rx,
            outcome_tx,
            outcome_rx,
            snapshot_tx,
            shutting_down: false,
        };
        (runtime, CoreHandle::new(command_tx, snapshot_rx))
    }

    pub async fn run(mut self) {
        info!(interval_secs = self.scan_interval.as_secs(), "browser runtime started");
        let mut ticker = interval(self.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !self.shutting_down {
            tokio::select! {
                _ = ticker.tick() => {
                    self.start_scan();
                }
                Some(outcome) = self.outcome_rx.recv() => {
                    self.handle_outcome(outcome);
                }
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        info!("all handles dropped");
                        self.shutting_down = true;
                    }
                },
            }
        }
        info!("browser runtime stopped");
    }

    fn publish(&self) {
        self.snapshot_tx
            .send_replace(BrowserSnapshot::capture(&self.state, &self.selection));
    }

    fn start_scan(&mut self) {
        if self.scan_in_flight {
            debug!("scan already in flight, skipping tick");
            return;
        }
        self.scan_in_flight = true;
        let (scan, known, tx) = (
            self.scan.clone(),
            self.state.devices.clone(),
            self.outcome_tx.clone(),
        );
        tokio::spawn(async move {
            let _ = tx.send(TaskOutcome::Scanned(scan.execute(known).await));
        });
    }

    fn start_listing(&mut self, path: RemotePath, reply: Reply<Option<Vec<RemoteFile>>>) {
        let Some((device, app)) = self.state.active_app_context() else {
            debug!(path = %path, "listing requested without an active app");
            let _ = reply.send(None);
            return;
        };
        let generation = self.state.next_generation();
        let (files, tx) = (self.files.clone(), self.outcome_tx.clone());
        tokio::spawn(async move {
            let listed = files.list_files(&device, &app, &path).await;
            let _ = tx.send(TaskOutcome::FilesListed {
                generation,
                path,
                files: listed,
                reply,
            });
        });
    }

    /// Run a single-file operation against the active app.
    fn start_file_op<F, Fut>(&mut self, refresh: bool, reply: Reply<bool>, op: F)
    where
        F: FnOnce(RemoteFileClient, DeviceId, AppId) -> Fut,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let Some((device, app)) = self.state.active_app_context() else {
            debug!("file operation requested without an active app");
            let _ = reply.send(false);
            return;
        };
        let generation = self.state.generation;
        let (work, tx) = (op(self.files.clone(), device, app), self.outcome_tx.clone());
        tokio::spawn(async move {
            let ok = work.await;
            let _ = tx.send(TaskOutcome::FileOpFinished {
                generation,
                ok,
                refresh,
                reply,
            });
        });
    }

    fn start_batch<F, Fut>(&mut self, reply: Reply<usize>, op: F)
    where
        F: FnOnce(TransferEngine, Vec<FileItem>) -> Fut,
        Fut: Future<Output = BatchOutcome> + Send + 'static,
    {
        let work = op(self.transfer.clone(), self.selection.snapshot());
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let outcome = work.await;
            let _ = tx.send(TaskOutcome::BatchFinished { outcome, reply });
        });
    }

    fn handle_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::ScanNow { reply } => {
                if self.scan_in_flight {
                    self.deferred_waiters.push(reply);
                } else {
                    self.scan_waiters.push(reply);
                    self.start_scan();
                }
            }
            CoreCommand::Devices { reply } => {
                let _ = reply.send(self.state.devices.clone());
            }
            CoreCommand::SelectDevice { device, reply } => self.select_device(device, reply),
            CoreCommand::SelectApp { app, reply } => {
                if self.state.active_device.is_none() {
                    let _ = reply.send(None);
                    return;
                }
                self.state.clear_active_app();
                self.state.active_app = Some(app);
                self.publish();
                self.start_listing(RemotePath::documents(), reply);
            }
            CoreCommand::OpenDirectory { path, reply } => self.start_listing(path, reply),
            CoreCommand::NavigateUp { reply } => {
                let current = &self.state.current_path;
                let parent = current.parent().unwrap_or_else(|| current.clone());
                self.start_listing(parent, reply);
            }
            CoreCommand::Refresh { reply } => {
                let current = self.state.current_path.clone();
                self.start_listing(current, reply);
            }
            CoreCommand::DownloadFile {
                path,
                destination,
                reply,
            } => self.start_file_op(false, reply, move |files, device, app| async move {
                files.download_tree(&device, &app, &path, &destination).await
            }),
            CoreCommand::UploadFile { source, reply } => {
                let destination = self.state.current_path.clone();
                self.start_file_op(true, reply, move |files, device, app| async move {
                    files.upload_tree(&device, &app, &source, &destination).await
                })
            }
            CoreCommand::DeleteFile { path, reply } => {
                self.start_file_op(true, reply, move |files, device, app| async move {
                    files.delete_tree(&device, &app, &path).await
                })
            }

            CoreCommand::Add { item, reply } => {
                let added = self.selection.add(item);
                self.after_selection_change(added, reply);
            }
            CoreCommand::Toggle { item, reply } => {
                let selected = self.selection.toggle(item);
                self.publish();
                let _ = reply.send(selected);
            }
            CoreCommand::Remove { key, reply } => {
                let removed = self.selection.remove(&key);
                self.after_selection_change(removed, reply);
            }
            CoreCommand::Clear { reply } => {
                let had_items = !self.selection.is_empty();
                self.selection.clear();
                if had_items {
                    self.publish();
                }
                let _ = reply.send(());
            }
            CoreCommand::RenameLocalIdentity {
                old_path,
                new_path,
                reply,
            } => {
                let renamed = self.selection.rename_local_identity(&old_path, &new_path);
                self.after_selection_change(renamed, reply);
            }
            CoreCommand::Selection { reply } => {
                let _ = reply.send(self.selection.snapshot());
            }

            CoreCommand::DownloadAll {
                destination,
                move_items,
                reply,
            } => self.start_batch(reply, move |engine, items| async move {
                engine.download_all(&items, &destination, move_items).await
            }),
            CoreCommand::UploadAll {
                device,
                app,
                destination,
                reply,
            } => self.start_batch(reply, move |engine, items| async move {
                engine.upload_all(&items, &device, &app, &destination).await
            }),
            CoreCommand::DeleteAll { reply } => {
                self.start_batch(reply, |engine, items| async move {
                    engine.delete_all(&items).await
                })
            }
            CoreCommand::MoveLocalAll { destination, reply } => {
                self.start_batch(reply, move |engine, items| async move {
                    engine.move_local_all(&items, &destination).await
                })
            }
            CoreCommand::CopyLocalAll { destination, reply } => {
                self.start_batch(reply, move |engine, items| async move {
                    engine.copy_local_all(&items, &destination).await
                })
            }

            CoreCommand::Shutdown => {
                info!("browser runtime shutting down");
                self.shutting_down = true;
            }
        }
    }

    fn select_device(&mut self, device: DeviceId, reply: Reply<Option<Vec<App>>>) {
        if !self.state.devices.iter().any(|d| d.id == device) {
            warn!(device_id = %device, "selected device is not attached");
            let _ = reply.send(None);
            return;
        }
        self.state.clear_active_device();
        self.state.active_device = Some(device.clone());
        let generation = self.state.device_generation;
        self.publish();

        let (list_apps, tx) = (self.list_apps.clone(), self.outcome_tx.clone());
        tokio::spawn(async move {
            let apps = list_apps.execute(&device).await;
            let _ = tx.send(TaskOutcome::AppsListed {
                generation,
                device,
                apps,
                reply,
            });
        });
    }

    fn after_selection_change(&mut self, changed: bool, reply: Reply<bool>) {
        if changed {
            self.publish();
        }
        let _ = reply.send(changed);
    }

    fn handle_outcome(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Scanned(result) => {
                self.scan_in_flight = false;
                if let Some(devices) = result {
                    self.apply_scan(devices);
                }
                for waiter in self.scan_waiters.drain(..) {
                    let _ = waiter.send(self.state.devices.clone());
                }
                if !self.deferred_waiters.is_empty() {
                    self.scan_waiters = std::mem::take(&mut self.deferred_waiters);
                    self.start_scan();
                }
            }
            TaskOutcome::AppsListed {
                generation,
                device,
                apps,
                reply,
            } => {
                if generation != self.state.device_generation
                    || self.state.active_device.as_ref() != Some(&device)
                {
                    debug!(device_id = %device, "discarding stale app list");
                    let _ = reply.send(None);
                    return;
                }
                match &apps {
                    Some(apps) => {
                        self.state.apps = apps.clone();
                        self.state.last_error = None;
                    }
                    None => {
                        self.state.last_error = Some(format!("Could not list apps on {device}"));
                    }
                }
                self.publish();
                let _ = reply.send(apps);
            }
            TaskOutcome::FilesListed {
                generation,
                path,
                files,
                reply,
            } => {
                if generation != self.state.generation {
                    debug!(path = %path, "discarding stale listing");
                    let _ = reply.send(None);
                    return;
                }
                match &files {
                    Some(files) => {
                        self.state.files = files.clone();
                        self.state.current_path = path;
                        self.state.last_error = None;
                    }
                    None => {
                        self.state.last_error = Some(format!("Could not list {path}"));
                    }
                }
                self.publish();
                let _ = reply.send(files);
            }
            TaskOutcome::FileOpFinished {
                generation,
                ok,
                refresh,
                reply,
            } => {
                let _ = reply.send(ok);
                if refresh && generation == self.state.generation {
                    let (reply, _) = oneshot::channel();
                    let current = self.state.current_path.clone();
                    self.start_listing(current, reply);
                }
            }
            TaskOutcome::BatchFinished { outcome, reply } => {
                let before = self.selection.version();
                outcome.apply(&mut self.selection);
                if self.selection.version() != before {
                    self.publish();
                }
                let _ = reply.send(outcome.count());
            }
        }
    }

    fn apply_scan(&mut self, devices: Vec<Device>) {
        self.state.devices = devices;
        self.state.last_error = None;
        if let Some(active) = &self.state.active_device {
            if !self.state.devices.iter().any(|d| &d.id == active) {
                info!(device_id = %active, "active device detached");
                self.state.clear_active_device();
            }
        }
        self.publish();
    }
}
