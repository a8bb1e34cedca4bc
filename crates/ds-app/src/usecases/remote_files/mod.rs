//! Filesystem-like access to one app's document store.
//!
//! Each top-level call opens one file-access chain, does all of its work
//! through it (including whole-tree recursion) and releases it. Protocol
//! failures are logged and surface as `None`/`false`.

mod actions;
mod sandbox;
pub mod tree;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ds_core::ids::{AppId, DeviceId};
use ds_core::ports::LocalFsPort;
use ds_core::remote::{compare_for_listing, RemoteFile, RemotePath, RemoteStat};
use tracing::{debug, info, warn};

use super::blocking::run_blocking;
use super::session::ChainFactory;
use actions::{DeleteAction, DownloadAction, LocalTree, UploadAction};
use tree::{walk, FailurePolicy};

pub use sandbox::{RemoteSandbox, CHUNK_SIZE};

#[derive(Clone)]
pub struct RemoteFileClient {
    chains: ChainFactory,
    local: Arc<dyn LocalFsPort>,
}

impl RemoteFileClient {
    pub fn new(chains: ChainFactory, local: Arc<dyn LocalFsPort>) -> Self {
        Self { chains, local }
    }

    fn with_sandbox<T>(
        &self,
        device: &DeviceId,
        app: &AppId,
        op: &'static str,
        work: impl FnOnce(&mut RemoteSandbox<'_>) -> T,
    ) -> Option<T> {
        let mut chain = match self.chains.file_access(device, app) {
            Ok(chain) => chain,
            Err(e) => {
                warn!(op, app_id = %app, error = %e, "file access unavailable");
                return None;
            }
        };
        let mut sandbox = RemoteSandbox::new(chain.client().as_mut());
        Some(work(&mut sandbox))
    }

    /// Entries under `path` with their stat, directories first.
    pub fn list_files_blocking(
        &self,
        device: &DeviceId,
        app: &AppId,
        path: &RemotePath,
    ) -> Option<Vec<RemoteFile>> {
        self.with_sandbox(device, app, "list_files", |sandbox| {
            let names = sandbox.list_directory(path)?;
            let mut files: Vec<RemoteFile> = names
                .into_iter()
                .filter_map(|name| {
                    let child = path.join(&name);
                    match sandbox.stat(&child) {
                        Some(stat) => Some(RemoteFile::new(child, stat)),
                        None => {
                            debug!(path = %child, "skipping entry without stat");
                            None
                        }
                    }
                })
                .collect();
            files.sort_by(compare_for_listing);
            Some(files)
        })
        .flatten()
    }

    pub fn stat_blocking(&self, device: &DeviceId, app: &AppId, path: &RemotePath) -> Option<RemoteStat> {
        self.with_sandbox(device, app, "stat", |sandbox| sandbox.stat(path))
            .flatten()
    }

    pub fn mkdir_blocking(&self, device: &DeviceId, app: &AppId, path: &RemotePath) -> bool {
        self.with_sandbox(device, app, "mkdir", |sandbox| sandbox.mkdir(path))
            .unwrap_or(false)
    }

    pub fn remove_blocking(&self, device: &DeviceId, app: &AppId, path: &RemotePath) -> bool {
        self.with_sandbox(device, app, "remove", |sandbox| sandbox.remove(path))
            .unwrap_or(false)
    }

    /// Copy the remote file or directory at `source` into `destination_dir`.
    pub fn download_tree_blocking(
        &self,
        device: &DeviceId,
        app: &AppId,
        source: &RemotePath,
        destination_dir: &Path,
    ) -> bool {
        let local = self.local.clone();
        let ok = self
            .with_sandbox(device, app, "download_tree", |sandbox| {
                let mut action = DownloadAction::new(local.as_ref(), destination_dir);
                walk(sandbox, &mut action, source, FailurePolicy::ContinueSiblings)
            })
            .unwrap_or(false);
        info!(source = %source, destination = %destination_dir.display(), ok, "download_tree finished");
        ok
    }

    /// Copy the local file or directory at `source` into `destination_dir`.
    pub fn upload_tree_blocking(
        &self,
        device: &DeviceId,
        app: &AppId,
        source: &Path,
        destination_dir: &RemotePath,
    ) -> bool {
        let local = self.local.clone();
        let ok = self
            .with_sandbox(device, app, "upload_tree", |sandbox| {
                let mut nodes = LocalTree::new(local.as_ref());
                let mut action = UploadAction::new(sandbox, destination_dir.clone());
                walk(&mut nodes, &mut action, &source.to_path_buf(), FailurePolicy::ContinueSiblings)
            })
            .unwrap_or(false);
        info!(source = %source.display(), destination = %destination_dir, ok, "upload_tree finished");
        ok
    }

    /// Remove `path` and everything under it. Stops at the first failed
    /// removal; whatever was already removed stays removed.
    pub fn delete_tree_blocking(&self, device: &DeviceId, app: &AppId, path: &RemotePath) -> bool {
        if path.is_root() {
            warn!(app_id = %app, "refusing to delete sandbox root");
            return false;
        }
        let ok = self
            .with_sandbox(device, app, "delete_tree", |sandbox| {
                walk(sandbox, &mut DeleteAction, path, FailurePolicy::AbortTree)
            })
            .unwrap_or(false);
        info!(path = %path, ok, "delete_tree finished");
        ok
    }

    pub async fn list_files(
        &self,
        device: &DeviceId,
        app: &AppId,
        path: &RemotePath,
    ) -> Option<Vec<RemoteFile>> {
        let (this, device, app, path) = (self.clone(), device.clone(), app.clone(), path.clone());
        run_blocking(move || this.list_files_blocking(&device, &app, &path))
            .await
            .flatten()
    }

    pub async fn stat(&self, device: &DeviceId, app: &AppId, path: &RemotePath) -> Option<RemoteStat> {
        let (this, device, app, path) = (self.clone(), device.clone(), app.clone(), path.clone());
        run_blocking(move || this.stat_blocking(&device, &app, &path))
            .await
            .flatten()
    }

    pub async fn mkdir(&self, device: &DeviceId, app: &AppId, path: &RemotePath) -> bool {
        let (this, device, app, path) = (self.clone(), device.clone(), app.clone(), path.clone());
        run_blocking(move || this.mkdir_blocking(&device, &app, &path))
            .await
            .unwrap_or(false)
    }

    pub async fn remove(&self, device: &DeviceId, app: &AppId, path: &RemotePath) -> bool {
        let (this, device, app, path) = (self.clone(), device.clone(), app.clone(), path.clone());
        run_blocking(move || this.remove_blocking(&device, &app, &path))
            .await
            .unwrap_or(false)
    }

    #[tracing::instrument(name = "usecase.download_tree", skip(self), fields(device_id = %device, app_id = %app, source = %source))]
    pub async fn download_tree(
        &self,
        device: &DeviceId,
        app: &AppId,
        source: &RemotePath,
        destination_dir: &Path,
    ) -> bool {
        let (this, device, app, source) = (self.clone(), device.clone(), app.clone(), source.clone());
        let destination_dir = destination_dir.to_path_buf();
        run_blocking(move || this.download_tree_blocking(&device, &app, &source, &destination_dir))
            .await
            .unwrap_or(false)
    }

    #[tracing::instrument(name = "usecase.upload_tree", skip(self), fields(device_id = %device, app_id = %app, destination = %destination_dir))]
    pub async fn upload_tree(
        &self,
        device: &DeviceId,
        app: &AppId,
        source: &Path,
        destination_dir: &RemotePath,
    ) -> bool {
        let (this, device, app) = (self.clone(), device.clone(), app.clone());
        let (source, destination_dir): (PathBuf, RemotePath) =
            (source.to_path_buf(), destination_dir.clone());
        run_blocking(move || this.upload_tree_blocking(&device, &app, &source, &destination_dir))
            .await
            .unwrap_or(false)
    }

    #[tracing::instrument(name = "usecase.delete_tree", skip(self), fields(device_id = %device, app_id = %app, path = %path))]
    pub async fn delete_tree(&self, device: &DeviceId, app: &AppId, path: &RemotePath) -> bool {
        let (this, device, app, path) = (self.clone(), device.clone(), app.clone(), path.clone());
        run_blocking(move || this.delete_tree_blocking(&device, &app, &path))
            .await
            .unwrap_or(false)
    }
}
