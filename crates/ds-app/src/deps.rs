//! # Application Dependencies
//!
//! Parameter grouping for runtime construction. Not a builder: no defaults,
//! no build steps, every port is required.

use std::sync::Arc;
use ds_core::ports::{DeviceTransportPort, LocalFsPort, NotificationPort};

pub struct AppDeps {
    // Device
    pub transport: Arc<dyn DeviceTransportPort>,

    // Local disk
    pub local_fs: Arc<dyn LocalFsPort>,

    // Reporting surface
    pub notifier: Arc<dyn NotificationPort>,
}
