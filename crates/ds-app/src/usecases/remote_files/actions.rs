//! Node actions and the local tree source used by the recursive operations.

use std::path::{Path, PathBuf};

use ds_core::ports::LocalFsPort;
use ds_core::remote::RemotePath;
use tracing::{debug, warn};

use super::sandbox::RemoteSandbox;
use super::tree::{NodeAction, NodeKind, TreeNodes};

/// Local filesystem seen as a tree source.
pub struct LocalTree<'a> {
    fs: &'a dyn LocalFsPort,
}

impl<'a> LocalTree<'a> {
    pub fn new(fs: &'a dyn LocalFsPort) -> Self {
        Self { fs }
    }
}

impl TreeNodes for LocalTree<'_> {
    type Path = PathBuf;

    fn kind(&mut self, path: &PathBuf) -> Option<NodeKind> {
        match self.fs.stat(path) {
            Ok(entry) if entry.is_directory => Some(NodeKind::Directory),
            Ok(_) => Some(NodeKind::File),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "local stat failed");
                None
            }
        }
    }

    fn child_names(&mut self, path: &PathBuf) -> Option<Vec<String>> {
        match self.fs.list_directory(path) {
            Ok(mut names) => {
                names.sort();
                Some(names)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "local listing failed");
                None
            }
        }
    }

    fn child_path(&self, parent: &PathBuf, name: &str) -> PathBuf {
        parent.join(name)
    }

    fn name_of(&self, path: &PathBuf) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn local_target(destination: &Path, relative: &[String]) -> PathBuf {
    relative
        .iter()
        .fold(destination.to_path_buf(), |acc, part| acc.join(part))
}

fn remote_target(destination: &RemotePath, relative: &[String]) -> RemotePath {
    relative
        .iter()
        .fold(destination.clone(), |acc, part| acc.join(part))
}

/// Mirrors a remote subtree under a local directory.
pub struct DownloadAction<'a> {
    local: &'a dyn LocalFsPort,
    destination: PathBuf,
}

impl<'a> DownloadAction<'a> {
    pub fn new(local: &'a dyn LocalFsPort, destination: &Path) -> Self {
        Self {
            local,
            destination: destination.to_path_buf(),
        }
    }
}

impl<'s> NodeAction<RemoteSandbox<'s>> for DownloadAction<'_> {
    fn enter_directory(
        &mut self,
        _nodes: &mut RemoteSandbox<'s>,
        _path: &RemotePath,
        relative: &[String],
    ) -> bool {
        let target = local_target(&self.destination, relative);
        match self.local.mkdir(&target) {
            Ok(()) => true,
            Err(e) => {
                warn!(target = %target.display(), error = %e, "local mkdir failed");
                false
            }
        }
    }

    fn visit_file(
        &mut self,
        nodes: &mut RemoteSandbox<'s>,
        path: &RemotePath,
        relative: &[String],
    ) -> bool {
        let target = local_target(&self.destination, relative);
        let mut sink = match self.local.create_write(&target) {
            Ok(sink) => sink,
            Err(e) => {
                warn!(target = %target.display(), error = %e, "local create failed");
                return false;
            }
        };
        let ok = nodes.read_into(path, sink.as_mut());
        debug!(source = %path, target = %target.display(), ok, "downloaded file");
        ok
    }

    fn leave_directory(&mut self, _: &mut RemoteSandbox<'s>, _: &RemotePath, _: &[String]) -> bool {
        true
    }
}

/// Mirrors a local subtree under a remote directory.
pub struct UploadAction<'s, 'c> {
    sandbox: &'s mut RemoteSandbox<'c>,
    destination: RemotePath,
}

impl<'s, 'c> UploadAction<'s, 'c> {
    pub fn new(sandbox: &'s mut RemoteSandbox<'c>, destination: RemotePath) -> Self {
        Self {
            sandbox,
            destination,
        }
    }
}

impl<'l> NodeAction<LocalTree<'l>> for UploadAction<'_, '_> {
    fn enter_directory(&mut self, _: &mut LocalTree<'l>, _: &PathBuf, relative: &[String]) -> bool {
        let target = remote_target(&self.destination, relative);
        self.sandbox.mkdir(&target)
    }

    fn visit_file(&mut self, nodes: &mut LocalTree<'l>, path: &PathBuf, relative: &[String]) -> bool {
        let target = remote_target(&self.destination, relative);
        let mut source = match nodes.fs.open_read(path) {
            Ok(source) => source,
            Err(e) => {
                warn!(source = %path.display(), error = %e, "local open failed");
                return false;
            }
        };
        let ok = self.sandbox.write_from(&target, source.as_mut());
        debug!(source = %path.display(), target = %target, ok, "uploaded file");
        ok
    }

    fn leave_directory(&mut self, _: &mut LocalTree<'l>, _: &PathBuf, _: &[String]) -> bool {
        true
    }
}

/// Removes leaves first, then each directory once it is empty.
pub struct DeleteAction;

impl<'s> NodeAction<RemoteSandbox<'s>> for DeleteAction {
    fn enter_directory(&mut self, _: &mut RemoteSandbox<'s>, _: &RemotePath, _: &[String]) -> bool {
        true
    }

    fn visit_file(&mut self, nodes: &mut RemoteSandbox<'s>, path: &RemotePath, _: &[String]) -> bool {
        nodes.remove(path)
    }

    fn leave_directory(
        &mut self,
        nodes: &mut RemoteSandbox<'s>,
        path: &RemotePath,
        _: &[String],
    ) -> bool {
        nodes.remove(path)
    }
}
