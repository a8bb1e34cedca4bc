use std::collections::BTreeMap;
use std::path::Path;

use super::file_item::{FileItem, FileItemKey, FileSource};

/// Set of selected files, unique by [`FileItemKey`].
///
/// `version` increases on every mutation that changes membership so views can
/// detect staleness by comparing one integer. No-op calls leave it untouched.
#[derive(Debug, Default, Clone)]
pub struct SelectionSet {
    items: BTreeMap<FileItemKey, FileItem>,
    version: u64,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, key: &FileItemKey) -> bool {
        self.items.contains_key(key)
    }

    /// Insert `item`; returns `false` (and changes nothing) if its identity is
    /// already present.
    pub fn add(&mut self, item: FileItem) -> bool {
        if self.items.contains_key(&item.key) {
            return false;
        }
        self.items.insert(item.key.clone(), item);
        self.bump();
        true
    }

    /// Flip membership of `item`; returns whether it is selected afterwards.
    pub fn toggle(&mut self, item: FileItem) -> bool {
        let selected = if self.items.remove(&item.key).is_some() {
            false
        } else {
            self.items.insert(item.key.clone(), item);
            true
        };
        self.bump();
        selected
    }

    pub fn remove(&mut self, key: &FileItemKey) -> bool {
        if self.items.remove(key).is_none() {
            return false;
        }
        self.bump();
        true
    }

    /// Remove every key in `keys`; returns how many were present.
    pub fn remove_all<'a>(&mut self, keys: impl IntoIterator<Item = &'a FileItemKey>) -> usize {
        keys.into_iter().filter(|key| self.remove(key)).count()
    }

    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.items.clear();
        self.bump();
    }

    /// Replace the identity of a selected local file that was renamed
    /// elsewhere, keeping it selected. Counts as one mutation.
    ///
    /// Returns `false` if `old_path` was not selected.
    pub fn rename_local_identity(&mut self, old_path: &Path, new_path: &Path) -> bool {
        let old_key = FileItemKey::Local(old_path.to_path_buf());
        let Some(old_item) = self.items.remove(&old_key) else {
            return false;
        };
        let renamed = old_item.relocated(new_path);
        self.items.insert(renamed.key.clone(), renamed);
        self.bump();
        true
    }

    pub fn items(&self) -> impl Iterator<Item = &FileItem> {
        self.items.values()
    }

    /// Owned copy of the current members, in key order.
    pub fn snapshot(&self) -> Vec<FileItem> {
        self.items.values().cloned().collect()
    }

    pub fn items_from(&self, source: FileSource) -> Vec<FileItem> {
        self.items
            .values()
            .filter(|item| item.source() == source)
            .cloned()
            .collect()
    }

    fn bump(&mut self) {
        self.version += 1;
        #[cfg(feature = "tracing")]
        tracing::trace!(version = self.version, len = self.items.len(), "selection changed");
    }
}
