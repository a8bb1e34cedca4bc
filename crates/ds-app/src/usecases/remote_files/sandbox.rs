//! Primitive operations on one vended sandbox, with protocol failures
//! absorbed into `Option`/`bool`.

use std::io::{Read, Write};

use ds_core::ports::{DeviceError, FileAccessPort, FileAccessStatus, FileHandle, OpenMode};
use ds_core::remote::{RemotePath, RemoteStat};
use tracing::{debug, warn};

use super::tree::{NodeKind, TreeNodes};

/// Fixed transfer chunk size.
pub const CHUNK_SIZE: usize = 64 * 1024;

pub struct RemoteSandbox<'a> {
    channel: &'a mut dyn FileAccessPort,
}

impl<'a> RemoteSandbox<'a> {
    pub fn new(channel: &'a mut dyn FileAccessPort) -> Self {
        Self { channel }
    }

    /// Entry names under `path`, without the `.`/`..` pseudo-entries.
    pub fn list_directory(&mut self, path: &RemotePath) -> Option<Vec<String>> {
        match self.channel.read_directory(path.as_str()) {
            Ok(names) => Some(
                names
                    .into_iter()
                    .filter(|name| !name.is_empty() && name != "." && name != "..")
                    .collect(),
            ),
            Err(e) => {
                warn!(path = %path, error = %e, "read_directory failed");
                None
            }
        }
    }

    pub fn stat(&mut self, path: &RemotePath) -> Option<RemoteStat> {
        match self.channel.file_info(path.as_str()) {
            Ok(info) => Some(RemoteStat::from_file_info(&info)),
            Err(e) => {
                debug!(path = %path, error = %e, "file_info failed");
                None
            }
        }
    }

    pub fn remove(&mut self, path: &RemotePath) -> bool {
        match self.channel.remove(path.as_str()) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path, error = %e, "remove failed");
                false
            }
        }
    }

    /// Create `path`, treating an existing directory as success.
    ///
    /// "Object exists" is recognized explicitly; for any other failure the
    /// path is stat'ed and only an existing directory counts as success.
    pub fn mkdir(&mut self, path: &RemotePath) -> bool {
        match self.channel.make_directory(path.as_str()) {
            Ok(()) => true,
            Err(DeviceError::Protocol {
                status: FileAccessStatus::ObjectExists,
                ..
            }) => true,
            Err(e) => {
                let exists_as_dir = self.stat(path).map(|s| s.is_directory).unwrap_or(false);
                if !exists_as_dir {
                    warn!(path = %path, error = %e, "make_directory failed");
                }
                exists_as_dir
            }
        }
    }

    /// Stream the remote file at `path` into `sink` in fixed chunks.
    pub fn read_into(&mut self, path: &RemotePath, sink: &mut dyn Write) -> bool {
        let handle = match self.channel.open(path.as_str(), OpenMode::ReadOnly) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(path = %path, error = %e, "open for read failed");
                return false;
            }
        };
        let copied = self.pump_out(handle, path, sink);
        self.close(handle, path) && copied
    }

    /// Stream `source` into the remote file at `path` in fixed chunks,
    /// creating or truncating it.
    pub fn write_from(&mut self, path: &RemotePath, source: &mut dyn Read) -> bool {
        let handle = match self.channel.open(path.as_str(), OpenMode::WriteTruncate) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(path = %path, error = %e, "open for write failed");
                return false;
            }
        };
        let copied = self.pump_in(handle, path, source);
        self.close(handle, path) && copied
    }

    fn pump_out(&mut self, handle: FileHandle, path: &RemotePath, sink: &mut dyn Write) -> bool {
        loop {
            let chunk = match self.channel.read(handle, CHUNK_SIZE) {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(path = %path, error = %e, "read chunk failed");
                    return false;
                }
            };
            if chunk.is_empty() {
                break;
            }
            if let Err(e) = sink.write_all(&chunk) {
                warn!(path = %path, error = %e, "local write failed");
                return false;
            }
        }
        match sink.flush() {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path, error = %e, "local flush failed");
                false
            }
        }
    }

    fn pump_in(&mut self, handle: FileHandle, path: &RemotePath, source: &mut dyn Read) -> bool {
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = match read_chunk(source, &mut buf) {
                Ok(n) => n,
                Err(e) => {
                    warn!(path = %path, error = %e, "local read failed");
                    return false;
                }
            };
            if n == 0 {
                return true;
            }
            if let Err(e) = self.channel.write(handle, &buf[..n]) {
                warn!(path = %path, error = %e, "write chunk failed");
                return false;
            }
        }
    }

    fn close(&mut self, handle: FileHandle, path: &RemotePath) -> bool {
        match self.channel.close(handle) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path, error = %e, "close failed");
                false
            }
        }
    }
}

/// Fill `buf` as far as the source allows; short only at end of input.
fn read_chunk(source: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl TreeNodes for RemoteSandbox<'_> {
    type Path = RemotePath;

    fn kind(&mut self, path: &RemotePath) -> Option<NodeKind> {
        self.stat(path).map(|stat| {
            if stat.is_directory {
                NodeKind::Directory
            } else {
                NodeKind::File
            }
        })
    }

    fn child_names(&mut self, path: &RemotePath) -> Option<Vec<String>> {
        self.list_directory(path)
    }

    fn child_path(&self, parent: &RemotePath, name: &str) -> RemotePath {
        parent.join(name)
    }

    fn name_of(&self, path: &RemotePath) -> String {
        path.file_name().unwrap_or_default().to_string()
    }
}
