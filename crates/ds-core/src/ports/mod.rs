//! Port interfaces for the application layer
//!
//! Ports define the contract between the use cases and infrastructure
//! implementations, keeping the core independent of USB transports, the
//! local disk and the UI.

pub mod device_transport;
pub mod errors;
mod local_fs;
mod notification;

pub use device_transport::{
    AppListingPort, BrowseOptions, DeviceConnectionPort, DeviceSessionPort, DeviceTransportPort,
    FileAccessPort, FileHandle, FileVendingPort, OpenMode, ServiceDescriptor,
    DEVICE_NAME_KEY, HOUSE_ARREST_SERVICE, INSTALLATION_PROXY_SERVICE,
};
pub use errors::{DeviceError, FileAccessStatus, LocalFsError};
pub use local_fs::LocalFsPort;
pub use notification::NotificationPort;
