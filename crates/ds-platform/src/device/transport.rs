//! [`DeviceTransportPort`] over usbmuxd.

use std::path::PathBuf;

use ds_core::config::AppConfig;
use ds_core::device::AttachedDevice;
use ds_core::ids::DeviceId;
use ds_core::ports::{
    AppListingPort, DeviceConnectionPort, DeviceError, DeviceSessionPort, DeviceTransportPort,
    FileVendingPort, ServiceDescriptor,
};
use tracing::{debug, info};

use super::house_arrest::HouseArrestClient;
use super::installation_proxy::InstallationProxyClient;
use super::lockdown::{LockdownClient, LOCKDOWN_PORT};
use super::pair_record::PairRecord;
use super::stream::{MuxStream, ServiceStream};
use super::tls;
use super::usbmux::{MuxDevice, UsbmuxAddress, UsbmuxClient};

pub struct UsbmuxTransport {
    address: UsbmuxAddress,
    pair_record_dir: PathBuf,
}

impl UsbmuxTransport {
    pub fn new(address: UsbmuxAddress, pair_record_dir: PathBuf) -> Self {
        Self {
            address,
            pair_record_dir,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            UsbmuxAddress::resolve(&config.usbmuxd_address),
            config.pair_record_dir.clone(),
        )
    }

    fn find(&self, device: &DeviceId) -> Result<MuxDevice, DeviceError> {
        UsbmuxClient::connect(&self.address)?
            .list_devices()?
            .into_iter()
            .find(|d| &d.udid == device)
            .ok_or_else(|| DeviceError::TransportUnavailable(format!("device {device} is not attached")))
    }
}

impl DeviceTransportPort for UsbmuxTransport {
    fn attached_devices(&self) -> Result<Vec<AttachedDevice>, DeviceError> {
        let listed = UsbmuxClient::connect(&self.address)?.list_devices()?;
        // A device on both USB and Wi-Fi is listed twice; the first entry wins.
        let mut attached: Vec<AttachedDevice> = Vec::with_capacity(listed.len());
        for device in &listed {
            if !attached.iter().any(|a| a.id == device.udid) {
                attached.push(device.into());
            }
        }
        Ok(attached)
    }

    fn open_device(&self, device: &DeviceId) -> Result<Box<dyn DeviceConnectionPort>, DeviceError> {
        let mux = self.find(device)?;
        let lockdown = UsbmuxClient::connect(&self.address)?.connect_to(mux.number, LOCKDOWN_PORT)?;
        debug!(device = %device, number = mux.number, "device connection opened");
        Ok(Box::new(UsbmuxConnection {
            address: self.address.clone(),
            pair_record_dir: self.pair_record_dir.clone(),
            device: mux,
            lockdown: Some(lockdown),
            pair: None,
        }))
    }
}

/// Stage-1 resource: the lockdown tunnel plus what is needed to open
/// service tunnels to the same device.
pub struct UsbmuxConnection {
    address: UsbmuxAddress,
    pair_record_dir: PathBuf,
    device: MuxDevice,
    lockdown: Option<MuxStream>,
    pair: Option<PairRecord>,
}

impl UsbmuxConnection {
    fn pair_record(&mut self) -> Result<&PairRecord, DeviceError> {
        if self.pair.is_none() {
            let record = PairRecord::load(&self.pair_record_dir, &self.address, &self.device.udid)?;
            self.pair = Some(record);
        }
        self.pair
            .as_ref()
            .ok_or_else(|| DeviceError::TransportUnavailable("pair record unavailable".into()))
    }

    fn open_service_stream(&mut self, descriptor: &ServiceDescriptor) -> Result<ServiceStream, DeviceError> {
        let raw = UsbmuxClient::connect(&self.address)?.connect_to(self.device.number, descriptor.port)?;
        if !descriptor.ssl {
            return Ok(ServiceStream::Plain(raw));
        }
        let pair = self.pair_record()?.clone();
        Ok(ServiceStream::Tls(Box::new(tls::upgrade(raw, &pair)?)))
    }
}

impl DeviceConnectionPort for UsbmuxConnection {
    fn handshake(&mut self, client_label: &str) -> Result<Box<dyn DeviceSessionPort>, DeviceError> {
        let stream = self.lockdown.take().ok_or_else(|| {
            DeviceError::TransportUnavailable("lockdown tunnel already in use".into())
        })?;
        let pair = self.pair_record()?.clone();
        let session = LockdownClient::establish(stream, client_label, &pair)?;
        info!(device = %self.device.udid, "device session established");
        Ok(Box::new(session))
    }

    fn open_app_listing(
        &mut self,
        descriptor: &ServiceDescriptor,
    ) -> Result<Box<dyn AppListingPort>, DeviceError> {
        let stream = self.open_service_stream(descriptor)?;
        Ok(Box::new(InstallationProxyClient::new(stream)))
    }

    fn open_file_vending(
        &mut self,
        descriptor: &ServiceDescriptor,
    ) -> Result<Box<dyn FileVendingPort>, DeviceError> {
        let stream = self.open_service_stream(descriptor)?;
        Ok(Box::new(HouseArrestClient::new(stream)))
    }
}

impl Drop for UsbmuxConnection {
    fn drop(&mut self) {
        debug!(device = %self.device.udid, "device connection released");
    }
}
