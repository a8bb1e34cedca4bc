use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ids::{AppId, DeviceId};
use crate::local::LocalEntry;
use crate::remote::{RemoteFile, RemotePath};

/// Where a selected file lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileSource {
    Local,
    Device,
}

/// Identity of a selected file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileItemKey {
    Local(PathBuf),
    Remote {
        device: DeviceId,
        app: AppId,
        path: RemotePath,
    },
}

impl FileItemKey {
    pub fn source(&self) -> FileSource {
        match self {
            FileItemKey::Local(_) => FileSource::Local,
            FileItemKey::Remote { .. } => FileSource::Device,
        }
    }
}

/// Source-tagged projection of a local entry or a remote file.
///
/// Never a source of truth: it can always be re-derived from a local path or a
/// [`RemoteFile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    pub key: FileItemKey,
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

impl FileItem {
    pub fn from_local(entry: &LocalEntry) -> Self {
        Self {
            key: FileItemKey::Local(entry.path.clone()),
            name: entry.name(),
            is_directory: entry.is_directory,
            size: entry.size,
            modified_at: entry.modified_at,
        }
    }

    pub fn from_remote(device: &DeviceId, app: &AppId, file: &RemoteFile) -> Self {
        Self {
            key: FileItemKey::Remote {
                device: device.clone(),
                app: app.clone(),
                path: file.path.clone(),
            },
            name: file.name.clone(),
            is_directory: file.is_directory,
            size: file.size,
            modified_at: file.modified_at,
        }
    }

    pub fn source(&self) -> FileSource {
        self.key.source()
    }

    pub fn local_path(&self) -> Option<&Path> {
        match &self.key {
            FileItemKey::Local(path) => Some(path),
            FileItemKey::Remote { .. } => None,
        }
    }

    /// Same attributes, re-keyed to a new local path.
    pub(crate) fn relocated(&self, new_path: &Path) -> Self {
        let name = new_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone());
        Self {
            key: FileItemKey::Local(new_path.to_path_buf()),
            name,
            ..self.clone()
        }
    }
}
