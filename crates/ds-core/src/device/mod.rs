//! Device domain models.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::ids::DeviceId;

/// How the host reaches an attached device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionKind {
    Usb,
    Network,
    Unknown,
}

impl ConnectionKind {
    /// Map the transport's connection type string ("USB", "Network").
    pub fn from_wire(value: &str) -> Self {
        match value {
            "USB" => ConnectionKind::Usb,
            "Network" => ConnectionKind::Network,
            _ => ConnectionKind::Unknown,
        }
    }
}

impl Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionKind::Usb => write!(f, "usb"),
            ConnectionKind::Network => write!(f, "network"),
            ConnectionKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A device identity as reported by the transport, before any name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedDevice {
    pub id: DeviceId,
    pub connection: ConnectionKind,
}

/// Device information published by the discovery loop.
///
/// Created or refreshed on every scan and dropped once the transport no longer
/// enumerates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub connection: ConnectionKind,
    pub connected: bool,
}

impl Device {
    pub fn new(id: DeviceId, name: impl Into<String>, connection: ConnectionKind) -> Self {
        Self {
            id,
            name: name.into(),
            connection,
            connected: true,
        }
    }

    /// A device whose name lookup failed is shown under its identifier.
    pub fn unnamed(attached: &AttachedDevice) -> Self {
        Self::new(
            attached.id.clone(),
            attached.id.as_str(),
            attached.connection,
        )
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }
}
