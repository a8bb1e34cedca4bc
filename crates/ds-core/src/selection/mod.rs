//! Unified selection over local and device files.

mod file_item;
mod set;

pub use file_item::{FileItem, FileItemKey, FileSource};
pub use set::SelectionSet;
