use std::collections::HashMap;

use ds_core::device::{AttachedDevice, Device};
use ds_core::ids::DeviceId;
use ds_core::ports::DEVICE_NAME_KEY;
use tracing::{debug, info, warn};

use super::blocking::run_blocking;
use super::session::ChainFactory;

/// One discovery pass over the transport.
#[derive(Clone)]
pub struct ScanDevices {
    chains: ChainFactory,
}

impl ScanDevices {
    pub fn new(chains: ChainFactory) -> Self {
        Self { chains }
    }

    /// Currently attached devices, in enumeration order.
    ///
    /// Names of devices already in `known` are reused; new identities get a
    /// best-effort name lookup through a throwaway session and fall back to
    /// the identifier. `None` means the transport could not be queried, in
    /// which case the caller keeps its previous list.
    pub fn execute_blocking(&self, known: &[Device]) -> Option<Vec<Device>> {
        let attached = match self.chains.transport().attached_devices() {
            Ok(attached) => attached,
            Err(e) => {
                warn!(error = %e, "device enumeration failed");
                return None;
            }
        };

        let known: HashMap<&DeviceId, &Device> = known.iter().map(|d| (&d.id, d)).collect();
        let mut devices: Vec<Device> = Vec::with_capacity(attached.len());
        for entry in &attached {
            if devices.iter().any(|d| d.id == entry.id) {
                // usbmuxd lists a device once per connection type
                continue;
            }
            let device = match known.get(&entry.id) {
                Some(existing) => Device::new(entry.id.clone(), &existing.name, entry.connection),
                None => {
                    let device = self.describe(entry);
                    info!(device_id = %device.id, name = %device.name, "device attached");
                    device
                }
            };
            devices.push(device);
        }
        for gone in known.keys().filter(|id| !devices.iter().any(|d| &&d.id == *id)) {
            info!(device_id = %gone, "device detached");
        }
        Some(devices)
    }

    fn describe(&self, attached: &AttachedDevice) -> Device {
        let mut session = match self.chains.device_session(&attached.id) {
            Ok(session) => session,
            Err(e) => {
                debug!(error = %e, "name lookup skipped");
                return Device::unnamed(attached);
            }
        };
        match session.session().value(DEVICE_NAME_KEY) {
            Ok(value) => match value.as_str().map(str::trim).filter(|s| !s.is_empty()) {
                Some(name) => Device::new(attached.id.clone(), name, attached.connection),
                None => Device::unnamed(attached),
            },
            Err(e) => {
                debug!(device_id = %attached.id, error = %e, "device name lookup failed");
                Device::unnamed(attached)
            }
        }
    }

    #[tracing::instrument(name = "usecase.scan_devices", skip_all, fields(known = known.len()))]
    pub async fn execute(&self, known: Vec<Device>) -> Option<Vec<Device>> {
        let this = self.clone();
        run_blocking(move || this.execute_blocking(&known)).await.flatten()
    }
}
