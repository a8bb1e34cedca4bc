//! Files inside one app's sandboxed document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// Root the file-sharing UI browses inside a vended container.
pub const DOCUMENTS_ROOT: &str = "/Documents";

/// Absolute, normalized path inside an app sandbox.
///
/// `.` segments are dropped and `..` never climbs above `/`, so a
/// `RemotePath` cannot name anything outside the sandbox it was built for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct RemotePath(String);

impl RemotePath {
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn documents() -> Self {
        Self::new(DOCUMENTS_ROOT)
    }

    pub fn new(path: &str) -> Self {
        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        Self(format!("/{}", segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn join(&self, name: &str) -> Self {
        Self::new(&format!("{}/{}", self.0, name))
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => Some(Self::root()),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }
}

impl Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemotePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RemotePath {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// Keys of the flat file-info record returned by the file-access channel.
mod info_keys {
    pub const SIZE: &str = "st_size";
    pub const FORMAT: &str = "st_ifmt";
    pub const MODIFIED: &str = "st_mtime";
    pub const DIRECTORY_MARKER: &str = "S_IFDIR";
}

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Parsed `stat` result for one remote entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteStat {
    pub is_directory: bool,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

impl RemoteStat {
    /// Parse a flat key/value file-info record.
    ///
    /// Directory-ness comes from the type marker. The modification time is
    /// reported in nanoseconds since the epoch and is truncated to seconds.
    pub fn from_file_info(info: &BTreeMap<String, String>) -> Self {
        let is_directory = info
            .get(info_keys::FORMAT)
            .map(|v| v == info_keys::DIRECTORY_MARKER)
            .unwrap_or(false);
        let size = info
            .get(info_keys::SIZE)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        let modified_at = info
            .get(info_keys::MODIFIED)
            .and_then(|v| v.parse::<u64>().ok())
            .and_then(|ns| i64::try_from(ns / NANOS_PER_SECOND).ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        Self {
            is_directory,
            size,
            modified_at,
        }
    }
}

/// One entry of a remote directory listing. Recomputed on every navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub path: RemotePath,
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

impl RemoteFile {
    pub fn new(path: RemotePath, stat: RemoteStat) -> Self {
        let name = path.file_name().unwrap_or("/").to_string();
        Self {
            path,
            name,
            is_directory: stat.is_directory,
            size: stat.size,
            modified_at: stat.modified_at,
        }
    }
}

/// Directories first, then case-insensitive by name.
pub fn compare_for_listing(a: &RemoteFile, b: &RemoteFile) -> std::cmp::Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}
