//! Device transport stages.
//!
//! Reaching a device service takes four acquisitions, each represented by a
//! trait object that owns its resources and releases them on drop:
//!
//! 1. [`DeviceTransportPort::open_device`] - device connection by identity
//! 2. [`DeviceConnectionPort::handshake`] - session identifying the client
//! 3. [`DeviceSessionPort::start_service`] - activation of a named service
//! 4. [`DeviceConnectionPort::open_app_listing`] /
//!    [`DeviceConnectionPort::open_file_vending`] - client bound to the descriptor
//!
//! All calls block; callers run them off the coordination context.

use crate::device::AttachedDevice;
use crate::ids::{AppId, DeviceId};
use crate::ports::errors::DeviceError;
use crate::wire::{WireRecord, WireValue};
use std::collections::BTreeMap;

pub const INSTALLATION_PROXY_SERVICE: &str = "com.apple.mobile.installation_proxy";
pub const HOUSE_ARREST_SERVICE: &str = "com.apple.mobile.house_arrest";

/// Session value holding the user-visible device name.
pub const DEVICE_NAME_KEY: &str = "DeviceName";

/// Result of a service activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub service: String,
    pub port: u16,
    pub ssl: bool,
}

/// Filter passed to the installation-listing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseOptions {
    pub application_type: String,
    pub attributes: Vec<String>,
}

impl BrowseOptions {
    /// Only user-installed applications, returning `attributes`.
    pub fn user_apps(attributes: &[&str]) -> Self {
        Self {
            application_type: "User".to_string(),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    /// Create or truncate, write only.
    WriteTruncate,
}

/// Handle returned by [`FileAccessPort::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHandle(pub u64);

pub trait DeviceTransportPort: Send + Sync {
    /// Identities of devices currently attached.
    fn attached_devices(&self) -> Result<Vec<AttachedDevice>, DeviceError>;

    /// Stage 1: open a connection to `device`.
    fn open_device(&self, device: &DeviceId) -> Result<Box<dyn DeviceConnectionPort>, DeviceError>;
}

pub trait DeviceConnectionPort: Send {
    /// Stage 2: handshake identifying the client application.
    fn handshake(&mut self, client_label: &str) -> Result<Box<dyn DeviceSessionPort>, DeviceError>;

    /// Stage 4: installation-listing client bound to `descriptor`.
    fn open_app_listing(
        &mut self,
        descriptor: &ServiceDescriptor,
    ) -> Result<Box<dyn AppListingPort>, DeviceError>;

    /// Stage 4: sandboxed-file-vending client bound to `descriptor`.
    fn open_file_vending(
        &mut self,
        descriptor: &ServiceDescriptor,
    ) -> Result<Box<dyn FileVendingPort>, DeviceError>;
}

pub trait DeviceSessionPort: Send {
    fn value(&mut self, key: &str) -> Result<WireValue, DeviceError>;

    /// Stage 3: activate `service`.
    fn start_service(&mut self, service: &str) -> Result<ServiceDescriptor, DeviceError>;
}

pub trait AppListingPort: Send {
    fn browse(&mut self, options: &BrowseOptions) -> Result<Vec<WireRecord>, DeviceError>;
}

pub trait FileVendingPort: Send {
    /// Ask for `app`'s document store; the channel becomes a file-access
    /// channel scoped to that sandbox.
    fn vend_documents(self: Box<Self>, app: &AppId) -> Result<Box<dyn FileAccessPort>, DeviceError>;
}

/// Flat file primitives inside one vended sandbox.
pub trait FileAccessPort: Send {
    /// Raw entry names, including the `.` and `..` pseudo-entries if the
    /// device reports them.
    fn read_directory(&mut self, path: &str) -> Result<Vec<String>, DeviceError>;

    fn file_info(&mut self, path: &str) -> Result<BTreeMap<String, String>, DeviceError>;

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<FileHandle, DeviceError>;

    /// Up to `len` bytes; an empty result means end of file.
    fn read(&mut self, handle: FileHandle, len: usize) -> Result<Vec<u8>, DeviceError>;

    fn write(&mut self, handle: FileHandle, data: &[u8]) -> Result<(), DeviceError>;

    fn close(&mut self, handle: FileHandle) -> Result<(), DeviceError>;

    fn remove(&mut self, path: &str) -> Result<(), DeviceError>;

    fn make_directory(&mut self, path: &str) -> Result<(), DeviceError>;
}
