use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use ds_core::app::App;
use ds_core::device::Device;
use ds_core::ids::{AppId, DeviceId};
use ds_core::remote::{RemoteFile, RemotePath};
use ds_core::selection::{FileItem, FileItemKey};
use tokio::sync::{mpsc, oneshot, watch};

use super::command::{CoreCommand, Reply};
use super::state::BrowserSnapshot;

/// Cloneable command surface of the coordinator.
///
/// Every call is a suspension point: the coordinator keeps serving other
/// requests while device I/O for this one runs in the background.
#[derive(Clone)]
pub struct CoreHandle {
    commands: mpsc::Sender<CoreCommand>,
    snapshot: watch::Receiver<BrowserSnapshot>,
}

impl CoreHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<CoreCommand>,
        snapshot: watch::Receiver<BrowserSnapshot>,
    ) -> Self {
        Self { commands, snapshot }
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> CoreCommand) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| anyhow!("browser runtime is not running"))?;
        response
            .await
            .context("browser runtime dropped the request")
    }

    /// Latest published state.
    pub fn snapshot(&self) -> BrowserSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<BrowserSnapshot> {
        self.snapshot.clone()
    }

    pub async fn scan_now(&self) -> Result<Vec<Device>> {
        self.request(|reply| CoreCommand::ScanNow { reply }).await
    }

    pub async fn devices(&self) -> Result<Vec<Device>> {
        self.request(|reply| CoreCommand::Devices { reply }).await
    }

    pub async fn select_device(&self, device: &DeviceId) -> Result<Option<Vec<App>>> {
        let device = device.clone();
        self.request(|reply| CoreCommand::SelectDevice { device, reply })
            .await
    }

    pub async fn select_app(&self, app: &AppId) -> Result<Option<Vec<RemoteFile>>> {
        let app = app.clone();
        self.request(|reply| CoreCommand::SelectApp { app, reply }).await
    }

    pub async fn open_directory(&self, path: &RemotePath) -> Result<Option<Vec<RemoteFile>>> {
        let path = path.clone();
        self.request(|reply| CoreCommand::OpenDirectory { path, reply })
            .await
    }

    pub async fn navigate_up(&self) -> Result<Option<Vec<RemoteFile>>> {
        self.request(|reply| CoreCommand::NavigateUp { reply }).await
    }

    pub async fn refresh(&self) -> Result<Option<Vec<RemoteFile>>> {
        self.request(|reply| CoreCommand::Refresh { reply }).await
    }

    pub async fn download_file(&self, path: &RemotePath, destination: &Path) -> Result<bool> {
        let (path, destination) = (path.clone(), destination.to_path_buf());
        self.request(|reply| CoreCommand::DownloadFile {
            path,
            destination,
            reply,
        })
        .await
    }

    pub async fn upload_file(&self, source: &Path) -> Result<bool> {
        let source = source.to_path_buf();
        self.request(|reply| CoreCommand::UploadFile { source, reply })
            .await
    }

    pub async fn delete_file(&self, path: &RemotePath) -> Result<bool> {
        let path = path.clone();
        self.request(|reply| CoreCommand::DeleteFile { path, reply })
            .await
    }

    pub async fn add(&self, item: FileItem) -> Result<bool> {
        self.request(|reply| CoreCommand::Add { item, reply }).await
    }

    pub async fn toggle(&self, item: FileItem) -> Result<bool> {
        self.request(|reply| CoreCommand::Toggle { item, reply }).await
    }

    pub async fn remove(&self, key: &FileItemKey) -> Result<bool> {
        let key = key.clone();
        self.request(|reply| CoreCommand::Remove { key, reply }).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.request(|reply| CoreCommand::Clear { reply }).await
    }

    pub async fn rename_local_identity(&self, old_path: &Path, new_path: &Path) -> Result<bool> {
        let (old_path, new_path): (PathBuf, PathBuf) = (old_path.into(), new_path.into());
        self.request(|reply| CoreCommand::RenameLocalIdentity {
            old_path,
            new_path,
            reply,
        })
        .await
    }

    pub async fn selection(&self) -> Result<Vec<FileItem>> {
        self.request(|reply| CoreCommand::Selection { reply }).await
    }

    pub async fn download_all(&self, destination: &Path, move_items: bool) -> Result<usize> {
        let destination = destination.to_path_buf();
        self.request(|reply| CoreCommand::DownloadAll {
            destination,
            move_items,
            reply,
        })
        .await
    }

    pub async fn upload_all(
        &self,
        device: &DeviceId,
        app: &AppId,
        destination: &RemotePath,
    ) -> Result<usize> {
        let (device, app, destination) = (device.clone(), app.clone(), destination.clone());
        self.request(|reply| CoreCommand::UploadAll {
            device,
            app,
            destination,
            reply,
        })
        .await
    }

    pub async fn delete_all(&self) -> Result<usize> {
        self.request(|reply| CoreCommand::DeleteAll { reply }).await
    }

    pub async fn move_local_all(&self, destination: &Path) -> Result<usize> {
        let destination = destination.to_path_buf();
        self.request(|reply| CoreCommand::MoveLocalAll { destination, reply })
            .await
    }

    pub async fn copy_local_all(&self, destination: &Path) -> Result<usize> {
        let destination = destination.to_path_buf();
        self.request(|reply| CoreCommand::CopyLocalAll { destination, reply })
            .await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.commands
            .send(CoreCommand::Shutdown)
            .await
            .map_err(|_| anyhow!("browser runtime is not running"))
    }
}
