//! # ds-core
//!
//! Core domain models and ports for DocShare.
//!
//! This crate contains pure business logic without any infrastructure dependencies.
//! Everything that touches a USB device, the local disk or the UI lives behind
//! the traits in [`ports`].

pub mod app;
pub mod config;
pub mod device;
pub mod ids;
pub mod local;
pub mod notice;
pub mod ports;
pub mod remote;
pub mod selection;
pub mod wire;

// Re-export commonly used types at the crate root
pub use app::{App, FileSharingCapability};
pub use config::AppConfig;
pub use device::{AttachedDevice, ConnectionKind, Device};
pub use ids::{AppId, DeviceId};
pub use local::LocalEntry;
pub use notice::{Notice, NoticeLevel};
pub use remote::{RemoteFile, RemotePath, RemoteStat};
pub use selection::{FileItem, FileItemKey, FileSource, SelectionSet};
pub use wire::{WireRecord, WireValue};
