//! [`LocalFsPort`] on top of `std::fs` and the platform trash.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ds_core::local::LocalEntry;
use ds_core::ports::{LocalFsError, LocalFsPort};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct StdLocalFs;

impl StdLocalFs {
    pub fn new() -> Self {
        Self
    }

    /// `destination_dir/<name of source>`, refusing to clobber an existing entry.
    fn target_for(source: &Path, destination_dir: &Path) -> Result<PathBuf, LocalFsError> {
        let name = source
            .file_name()
            .ok_or_else(|| LocalFsError::NotFound(source.to_path_buf()))?;
        if !source.exists() {
            return Err(LocalFsError::NotFound(source.to_path_buf()));
        }
        let target = destination_dir.join(name);
        if target.symlink_metadata().is_ok() {
            return Err(LocalFsError::AlreadyExists(target));
        }
        Ok(target)
    }

    fn copy_recursive(source: &Path, target: &Path) -> Result<(), LocalFsError> {
        let meta = fs::symlink_metadata(source).map_err(|e| LocalFsError::from_io(source, e))?;
        if meta.is_dir() {
            fs::create_dir(target).map_err(|e| LocalFsError::from_io(target, e))?;
            for entry in fs::read_dir(source).map_err(|e| LocalFsError::from_io(source, e))? {
                let entry = entry.map_err(|e| LocalFsError::from_io(source, e))?;
                Self::copy_recursive(&entry.path(), &target.join(entry.file_name()))?;
            }
        } else {
            fs::copy(source, target).map_err(|e| LocalFsError::from_io(source, e))?;
        }
        Ok(())
    }
}

impl LocalFsPort for StdLocalFs {
    fn stat(&self, path: &Path) -> Result<LocalEntry, LocalFsError> {
        let meta = fs::metadata(path).map_err(|e| LocalFsError::from_io(path, e))?;
        Ok(LocalEntry {
            path: path.to_path_buf(),
            is_directory: meta.is_dir(),
            size: if meta.is_dir() { 0 } else { meta.len() },
            modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<String>, LocalFsError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| LocalFsError::from_io(path, e))? {
            let entry = entry.map_err(|e| LocalFsError::from_io(path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn mkdir(&self, path: &Path) -> Result<(), LocalFsError> {
        fs::create_dir_all(path).map_err(|e| LocalFsError::from_io(path, e))
    }

    fn remove(&self, path: &Path) -> Result<(), LocalFsError> {
        let meta = fs::symlink_metadata(path).map_err(|e| LocalFsError::from_io(path, e))?;
        let result = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|e| LocalFsError::from_io(path, e))
    }

    fn copy(&self, source: &Path, destination_dir: &Path) -> Result<PathBuf, LocalFsError> {
        let target = Self::target_for(source, destination_dir)?;
        if let Err(e) = Self::copy_recursive(source, &target) {
            // leave nothing half-copied behind
            if target.symlink_metadata().is_ok() {
                if let Err(cleanup_err) = self.remove(&target) {
                    warn!(target = %target.display(), error = %cleanup_err, "partial copy left behind");
                }
            }
            return Err(e);
        }
        debug!(source = %source.display(), target = %target.display(), "copied");
        Ok(target)
    }

    fn move_to(&self, source: &Path, destination_dir: &Path) -> Result<PathBuf, LocalFsError> {
        let target = Self::target_for(source, destination_dir)?;
        match fs::rename(source, &target) {
            Ok(()) => {}
            Err(e) => {
                // different filesystem: copy then remove
                debug!(source = %source.display(), error = %e, "rename failed; copying instead");
                self.copy(source, destination_dir)?;
                if let Err(remove_err) = self.remove(source) {
                    warn!(source = %source.display(), error = %remove_err, "moved copy left source behind");
                    return Err(remove_err);
                }
            }
        }
        debug!(source = %source.display(), target = %target.display(), "moved");
        Ok(target)
    }

    fn trash(&self, path: &Path) -> Result<(), LocalFsError> {
        if path.symlink_metadata().is_err() {
            return Err(LocalFsError::NotFound(path.to_path_buf()));
        }
        trash::delete(path).map_err(|e| LocalFsError::Trash {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>, LocalFsError> {
        let file = File::open(path).map_err(|e| LocalFsError::from_io(path, e))?;
        Ok(Box::new(file))
    }

    fn create_write(&self, path: &Path) -> Result<Box<dyn Write + Send>, LocalFsError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| LocalFsError::from_io(path, e))?;
        Ok(Box::new(file))
    }
}
