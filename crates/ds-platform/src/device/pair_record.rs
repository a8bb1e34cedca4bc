//! Host pairing material for a trusted device.

use std::path::Path;

use ds_core::ids::DeviceId;
use ds_core::ports::DeviceError;
use plist::{Dictionary, Value};
use tracing::debug;

use super::plist_codec::{self, string_at};
use super::usbmux::{UsbmuxAddress, UsbmuxClient};

#[derive(Clone)]
pub struct PairRecord {
    pub host_id: String,
    pub system_buid: String,
    /// PEM
    pub host_certificate: Vec<u8>,
    /// PEM
    pub host_private_key: Vec<u8>,
}

impl std::fmt::Debug for PairRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairRecord")
            .field("host_id", &self.host_id)
            .field("system_buid", &self.system_buid)
            .finish_non_exhaustive()
    }
}

impl PairRecord {
    pub fn from_plist(bytes: &[u8]) -> Result<Self, DeviceError> {
        let record = plist_codec::decode_dict(bytes)?;
        let text = |key: &str| {
            string_at(&record, key)
                .map(str::to_string)
                .ok_or_else(|| DeviceError::Codec(format!("pair record missing {key}")))
        };
        Ok(Self {
            host_id: text("HostID")?,
            system_buid: text("SystemBUID")?,
            host_certificate: data_at(&record, "HostCertificate")?,
            host_private_key: data_at(&record, "HostPrivateKey")?,
        })
    }

    /// `<dir>/<udid>.plist` when `dir` is set, otherwise ask usbmuxd.
    pub fn load(dir: &Path, address: &UsbmuxAddress, udid: &DeviceId) -> Result<Self, DeviceError> {
        if !dir.as_os_str().is_empty() {
            let path = dir.join(format!("{udid}.plist"));
            debug!(path = %path.display(), "reading pair record from disk");
            let bytes = std::fs::read(&path).map_err(|e| {
                DeviceError::TransportUnavailable(format!("pair record {}: {e}", path.display()))
            })?;
            return Self::from_plist(&bytes);
        }
        let bytes = UsbmuxClient::connect(address)?.read_pair_record(udid)?;
        Self::from_plist(&bytes)
    }
}

fn data_at(record: &Dictionary, key: &str) -> Result<Vec<u8>, DeviceError> {
    match record.get(key) {
        Some(Value::Data(bytes)) => Ok(bytes.clone()),
        Some(Value::String(text)) => Ok(text.as_bytes().to_vec()),
        _ => Err(DeviceError::Codec(format!("pair record missing {key}"))),
    }
}
