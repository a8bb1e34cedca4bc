use std::path::PathBuf;

use ds_core::app::App;
use ds_core::device::Device;
use ds_core::ids::{AppId, DeviceId};
use ds_core::remote::{RemoteFile, RemotePath};
use ds_core::selection::{FileItem, FileItemKey};
use tokio::sync::oneshot;

use crate::usecases::BatchOutcome;

pub type Reply<T> = oneshot::Sender<T>;

/// Requests accepted by the coordinator. Each carries its reply channel.
#[derive(Debug)]
pub enum CoreCommand {
    /// Scan now; answered with the device list once the scan settles.
    ScanNow { reply: Reply<Vec<Device>> },
    Devices { reply: Reply<Vec<Device>> },
    SelectDevice { device: DeviceId, reply: Reply<Option<Vec<App>>> },
    SelectApp { app: AppId, reply: Reply<Option<Vec<RemoteFile>>> },
    OpenDirectory { path: RemotePath, reply: Reply<Option<Vec<RemoteFile>>> },
    NavigateUp { reply: Reply<Option<Vec<RemoteFile>>> },
    Refresh { reply: Reply<Option<Vec<RemoteFile>>> },
    DownloadFile { path: RemotePath, destination: PathBuf, reply: Reply<bool> },
    /// Upload into the current remote directory.
    UploadFile { source: PathBuf, reply: Reply<bool> },
    DeleteFile { path: RemotePath, reply: Reply<bool> },

    Add { item: FileItem, reply: Reply<bool> },
    Toggle { item: FileItem, reply: Reply<bool> },
    Remove { key: FileItemKey, reply: Reply<bool> },
    Clear { reply: Reply<()> },
    RenameLocalIdentity { old_path: PathBuf, new_path: PathBuf, reply: Reply<bool> },
    Selection { reply: Reply<Vec<FileItem>> },

    DownloadAll { destination: PathBuf, move_items: bool, reply: Reply<usize> },
    UploadAll { device: DeviceId, app: AppId, destination: RemotePath, reply: Reply<usize> },
    DeleteAll { reply: Reply<usize> },
    MoveLocalAll { destination: PathBuf, reply: Reply<usize> },
    CopyLocalAll { destination: PathBuf, reply: Reply<usize> },

    Shutdown,
}

/// Results of background work, delivered back to the coordinator.
#[derive(Debug)]
pub(crate) enum TaskOutcome {
    Scanned(Option<Vec<Device>>),
    AppsListed {
        generation: u64,
        device: DeviceId,
        apps: Option<Vec<App>>,
        reply: Reply<Option<Vec<App>>>,
    },
    FilesListed {
        generation: u64,
        path: RemotePath,
        files: Option<Vec<RemoteFile>>,
        reply: Reply<Option<Vec<RemoteFile>>>,
    },
    /// A single-file operation finished; `refresh` re-lists the current
    /// directory if the context is unchanged.
    FileOpFinished {
        generation: u64,
        ok: bool,
        refresh: bool,
        reply: Reply<bool>,
    },
    BatchFinished {
        outcome: BatchOutcome,
        reply: Reply<usize>,
    },
}
