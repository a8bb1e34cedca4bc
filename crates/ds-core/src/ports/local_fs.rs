use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::local::LocalEntry;
use crate::ports::errors::LocalFsError;

/// Local filesystem collaborator.
///
/// Blocking; callers run it off the coordination context.
pub trait LocalFsPort: Send + Sync {
    fn stat(&self, path: &Path) -> Result<LocalEntry, LocalFsError>;

    /// Entry names directly under `path`.
    fn list_directory(&self, path: &Path) -> Result<Vec<String>, LocalFsError>;

    /// Create `path`; succeeds if it already is a directory.
    fn mkdir(&self, path: &Path) -> Result<(), LocalFsError>;

    fn remove(&self, path: &Path) -> Result<(), LocalFsError>;

    /// Recursively copy `source` into `destination_dir`; returns the new path.
    fn copy(&self, source: &Path, destination_dir: &Path) -> Result<PathBuf, LocalFsError>;

    /// Move `source` into `destination_dir`; returns the new path.
    fn move_to(&self, source: &Path, destination_dir: &Path) -> Result<PathBuf, LocalFsError>;

    /// Soft delete into the platform trash.
    fn trash(&self, path: &Path) -> Result<(), LocalFsError>;

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>, LocalFsError>;

    /// Create `path` for writing; fails with `AlreadyExists` if it is taken.
    fn create_write(&self, path: &Path) -> Result<Box<dyn Write + Send>, LocalFsError>;
}
