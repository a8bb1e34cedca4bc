//! Bulk operations over the unified selection.
//!
//! The engine never touches the [`SelectionSet`] itself. It works on a
//! snapshot and returns a [`BatchOutcome`] that the coordinator applies, so
//! the set is only mutated from one place. Items are processed one at a time;
//! a failed item is reported and skipped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ds_core::ids::{AppId, DeviceId};
use ds_core::notice::Notice;
use ds_core::ports::{LocalFsError, LocalFsPort, NotificationPort};
use ds_core::remote::RemotePath;
use ds_core::selection::{FileItem, FileItemKey, FileSource, SelectionSet};
use tracing::{info, warn};

use super::blocking::run_blocking;
use super::remote_files::RemoteFileClient;

/// What a finished batch does to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEffect {
    Keep,
    RemoveSucceeded,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub requested: usize,
    pub succeeded: Vec<FileItemKey>,
    pub effect: SelectionEffect,
}

impl BatchOutcome {
    fn new(requested: usize, effect: SelectionEffect) -> Self {
        Self {
            requested,
            succeeded: Vec::new(),
            effect,
        }
    }

    pub fn count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed(&self) -> usize {
        self.requested - self.succeeded.len()
    }

    /// Apply the batch's selection effect.
    pub fn apply(&self, selection: &mut SelectionSet) {
        match self.effect {
            SelectionEffect::Keep => {}
            SelectionEffect::RemoveSucceeded => {
                selection.remove_all(&self.succeeded);
            }
            SelectionEffect::Clear => selection.clear(),
        }
    }
}

#[derive(Clone)]
pub struct TransferEngine {
    remote: RemoteFileClient,
    local: Arc<dyn LocalFsPort>,
    notifier: Arc<dyn NotificationPort>,
}

impl TransferEngine {
    pub fn new(
        remote: RemoteFileClient,
        local: Arc<dyn LocalFsPort>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        Self {
            remote,
            local,
            notifier,
        }
    }

    /// Download every remote item into `destination`. With `move_items`, a
    /// downloaded item is also deleted from the device and only counts once
    /// both steps succeed; succeeded items then leave the selection.
    #[tracing::instrument(name = "usecase.download_all", skip(self, items), fields(destination = %destination.display()))]
    pub async fn download_all(
        &self,
        items: &[FileItem],
        destination: &Path,
        move_items: bool,
    ) -> BatchOutcome {
        let remote_items = remote_items(items);
        let effect = if move_items {
            SelectionEffect::RemoveSucceeded
        } else {
            SelectionEffect::Keep
        };
        let mut outcome = BatchOutcome::new(remote_items.len(), effect);

        for (item, device, app, path) in remote_items {
            if !self.remote.download_tree(device, app, path, destination).await {
                self.report_failure("download", item);
                continue;
            }
            if move_items && !self.remote.delete_tree(device, app, path).await {
                self.notifier.notify(Notice::error(format!(
                    "Downloaded {} but could not remove it from the device",
                    item.name
                )));
                continue;
            }
            outcome.succeeded.push(item.key.clone());
        }

        self.finish(if move_items { "Moved" } else { "Downloaded" }, &outcome);
        outcome
    }

    /// Upload every local item into `destination` inside `app`'s sandbox.
    #[tracing::instrument(name = "usecase.upload_all", skip(self, items), fields(device_id = %device, app_id = %app, destination = %destination))]
    pub async fn upload_all(
        &self,
        items: &[FileItem],
        device: &DeviceId,
        app: &AppId,
        destination: &RemotePath,
    ) -> BatchOutcome {
        let local_items = local_items(items);
        let mut outcome = BatchOutcome::new(local_items.len(), SelectionEffect::Keep);

        for (item, path) in local_items {
            if self.remote.upload_tree(device, app, path, destination).await {
                outcome.succeeded.push(item.key.clone());
            } else {
                self.report_failure("upload", item);
            }
        }

        self.finish("Uploaded", &outcome);
        outcome
    }

    /// Trash local items and delete remote trees. The selection is cleared
    /// afterwards whatever the individual results.
    #[tracing::instrument(name = "usecase.delete_all", skip_all, fields(count = items.len()))]
    pub async fn delete_all(&self, items: &[FileItem]) -> BatchOutcome {
        let mut outcome = BatchOutcome::new(items.len(), SelectionEffect::Clear);

        for item in items {
            let ok = match &item.key {
                FileItemKey::Local(path) => {
                    let path = path.clone();
                    self.local_op(item, "trash", move |fs| fs.trash(&path))
                        .await
                        .is_some()
                }
                FileItemKey::Remote { device, app, path } => {
                    let ok = self.remote.delete_tree(device, app, path).await;
                    if !ok {
                        self.report_failure("delete", item);
                    }
                    ok
                }
            };
            if ok {
                outcome.succeeded.push(item.key.clone());
            }
        }

        self.finish("Deleted", &outcome);
        outcome
    }

    /// Move local items into `destination`; moved items leave the selection.
    #[tracing::instrument(name = "usecase.move_local_all", skip(self, items), fields(destination = %destination.display()))]
    pub async fn move_local_all(&self, items: &[FileItem], destination: &Path) -> BatchOutcome {
        self.local_batch(items, destination, "Moved", SelectionEffect::RemoveSucceeded, |fs, src, dest| {
            fs.move_to(src, dest)
        })
        .await
    }

    /// Copy local items into `destination`; the selection is unchanged.
    #[tracing::instrument(name = "usecase.copy_local_all", skip(self, items), fields(destination = %destination.display()))]
    pub async fn copy_local_all(&self, items: &[FileItem], destination: &Path) -> BatchOutcome {
        self.local_batch(items, destination, "Copied", SelectionEffect::Keep, |fs, src, dest| {
            fs.copy(src, dest)
        })
        .await
    }

    async fn local_batch<F>(
        &self,
        items: &[FileItem],
        destination: &Path,
        verb: &str,
        effect: SelectionEffect,
        op: F,
    ) -> BatchOutcome
    where
        F: Fn(&dyn LocalFsPort, &Path, &Path) -> Result<PathBuf, LocalFsError>
            + Clone
            + Send
            + 'static,
    {
        let local_items = local_items(items);
        let mut outcome = BatchOutcome::new(local_items.len(), effect);

        for (item, path) in local_items {
            let (source, dest, op) = (path.to_path_buf(), destination.to_path_buf(), op.clone());
            let label = verb.to_lowercase();
            if self
                .local_op(item, &label, move |fs| op(fs, &source, &dest))
                .await
                .is_some()
            {
                outcome.succeeded.push(item.key.clone());
            }
        }

        self.finish(verb, &outcome);
        outcome
    }

    /// Run one blocking local operation; failures are reported per item.
    async fn local_op<T, F>(&self, item: &FileItem, op_name: &str, op: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn LocalFsPort) -> Result<T, LocalFsError> + Send + 'static,
    {
        let fs = self.local.clone();
        match run_blocking(move || op(fs.as_ref())).await {
            Some(Ok(value)) => Some(value),
            Some(Err(e)) => {
                warn!(op = op_name, item = %item.name, error = %e, "local operation failed");
                self.notifier
                    .notify(Notice::error(format!("Could not {op_name} {}: {e}", item.name)));
                None
            }
            None => {
                self.report_failure(op_name, item);
                None
            }
        }
    }

    fn report_failure(&self, op_name: &str, item: &FileItem) {
        warn!(op = op_name, item = %item.name, "item failed");
        self.notifier
            .notify(Notice::error(format!("Could not {op_name} {}", item.name)));
    }

    fn finish(&self, verb: &str, outcome: &BatchOutcome) {
        info!(
            verb,
            requested = outcome.requested,
            succeeded = outcome.count(),
            "batch finished"
        );
        self.notifier
            .notify(Notice::batch(verb, outcome.count(), outcome.requested));
    }
}

type RemoteRef<'a> = (&'a FileItem, &'a DeviceId, &'a AppId, &'a RemotePath);

fn remote_items(items: &[FileItem]) -> Vec<RemoteRef<'_>> {
    items
        .iter()
        .filter_map(|item| match &item.key {
            FileItemKey::Remote { device, app, path } => Some((item, device, app, path)),
            FileItemKey::Local(_) => None,
        })
        .collect()
}

fn local_items(items: &[FileItem]) -> Vec<(&FileItem, &Path)> {
    items
        .iter()
        .filter(|item| item.source() == FileSource::Local)
        .filter_map(|item| item.local_path().map(|path| (item, path)))
        .collect()
}
