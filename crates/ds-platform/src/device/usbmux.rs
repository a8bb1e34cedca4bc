//! Client for the host's usbmuxd daemon.
//!
//! Packets carry a 16-byte little-endian header (`length`, `version`,
//! `message`, `tag`) followed by an XML plist. Each request uses its own
//! socket; `Connect` consumes it and hands back the tunnelled stream.

use std::io::{Read, Write};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

use ds_core::device::{AttachedDevice, ConnectionKind};
use ds_core::ids::DeviceId;
use ds_core::ports::DeviceError;
use plist::{Dictionary, Value};
use tracing::{debug, trace};

use super::plist_codec::{self, dict, string_at};
use super::stream::MuxStream;

/// Environment override for the daemon address (`UNIX:/path` or `host:port`).
pub const USBMUXD_ADDRESS_ENV: &str = "USBMUXD_SOCKET_ADDRESS";

#[cfg(unix)]
const DEFAULT_SOCKET: &str = "/var/run/usbmuxd";
#[cfg(not(unix))]
const DEFAULT_TCP: &str = "127.0.0.1:27015";

const HEADER_LEN: usize = 16;
const PROTOCOL_VERSION: u32 = 1;
const MESSAGE_PLIST: u32 = 8;
const MAX_PACKET_BYTES: usize = 4 * 1024 * 1024;
const PROG_NAME: &str = "docshare";
const CLIENT_VERSION: &str = concat!("docshare-", env!("CARGO_PKG_VERSION"));

/// Where usbmuxd listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsbmuxAddress {
    Unix(PathBuf),
    Tcp(String),
}

impl UsbmuxAddress {
    /// Environment override first, then `configured`, then the platform
    /// default.
    pub fn resolve(configured: &str) -> Self {
        let from_env = std::env::var(USBMUXD_ADDRESS_ENV).unwrap_or_default();
        let resolved = match [from_env.trim(), configured.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
        {
            Some(value) => Self::parse(value),
            None => Self::platform_default(),
        };
        resolved
    }

    pub fn parse(value: &str) -> Self {
        if let Some(path) = value.strip_prefix("UNIX:") {
            return UsbmuxAddress::Unix(PathBuf::from(path));
        }
        if value.starts_with('/') || !value.contains(':') {
            return UsbmuxAddress::Unix(PathBuf::from(value));
        }
        UsbmuxAddress::Tcp(value.to_string())
    }

    #[cfg(unix)]
    fn platform_default() -> Self {
        UsbmuxAddress::Unix(PathBuf::from(DEFAULT_SOCKET))
    }

    #[cfg(not(unix))]
    fn platform_default() -> Self {
        UsbmuxAddress::Tcp(DEFAULT_TCP.to_string())
    }

    pub fn connect(&self) -> Result<MuxStream, DeviceError> {
        let unavailable = |e: std::io::Error| {
            DeviceError::TransportUnavailable(format!("cannot reach usbmuxd at {self}: {e}"))
        };
        match self {
            #[cfg(unix)]
            UsbmuxAddress::Unix(path) => UnixStream::connect(path)
                .map(MuxStream::Unix)
                .map_err(unavailable),
            #[cfg(not(unix))]
            UsbmuxAddress::Unix(path) => Err(DeviceError::TransportUnavailable(format!(
                "unix socket {} not supported on this platform",
                path.display()
            ))),
            UsbmuxAddress::Tcp(addr) => TcpStream::connect(addr)
                .map(MuxStream::Tcp)
                .map_err(unavailable),
        }
    }
}

impl std::fmt::Display for UsbmuxAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsbmuxAddress::Unix(path) => write!(f, "{}", path.display()),
            UsbmuxAddress::Tcp(addr) => f.write_str(addr),
        }
    }
}

/// A device as listed by usbmuxd. `number` is only valid while attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxDevice {
    pub number: u32,
    pub udid: DeviceId,
    pub connection: ConnectionKind,
}

impl From<&MuxDevice> for AttachedDevice {
    fn from(device: &MuxDevice) -> Self {
        AttachedDevice {
            id: device.udid.clone(),
            connection: device.connection,
        }
    }
}

pub fn encode_packet(tag: u32, payload: &[u8]) -> Result<Vec<u8>, DeviceError> {
    let total = u32::try_from(HEADER_LEN + payload.len())
        .map_err(|_| DeviceError::Codec("usbmux packet too large".into()))?;
    let mut packet = Vec::with_capacity(HEADER_LEN + payload.len());
    packet.extend_from_slice(&total.to_le_bytes());
    packet.extend_from_slice(&PROTOCOL_VERSION.to_le_bytes());
    packet.extend_from_slice(&MESSAGE_PLIST.to_le_bytes());
    packet.extend_from_slice(&tag.to_le_bytes());
    packet.extend_from_slice(payload);
    Ok(packet)
}

/// Read one packet; returns `(tag, plist payload)`.
pub fn read_packet<R: Read + ?Sized>(reader: &mut R) -> Result<(u32, Vec<u8>), DeviceError> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header)?;
    let word = |i: usize| u32::from_le_bytes([header[i], header[i + 1], header[i + 2], header[i + 3]]);
    let (total, version, message, tag) = (word(0) as usize, word(4), word(8), word(12));
    trace!(stage = "usbmux_read", len = total, tag, "read packet header");

    if version != PROTOCOL_VERSION || message != MESSAGE_PLIST {
        return Err(DeviceError::Codec(format!(
            "unexpected usbmux packet version {version} message {message}"
        )));
    }
    if !(HEADER_LEN..=MAX_PACKET_BYTES).contains(&total) {
        return Err(DeviceError::Codec(format!("bad usbmux packet length {total}")));
    }
    let mut payload = vec![0u8; total - HEADER_LEN];
    reader.read_exact(&mut payload)?;
    Ok((tag, payload))
}

/// `Connect` expects the port in network byte order, read as a host integer.
pub fn wire_port(port: u16) -> u16 {
    u16::from_ne_bytes(port.to_be_bytes())
}

pub struct UsbmuxClient<S: Read + Write = MuxStream> {
    stream: S,
    tag: u32,
}

impl UsbmuxClient<MuxStream> {
    pub fn connect(address: &UsbmuxAddress) -> Result<Self, DeviceError> {
        Ok(Self::new(address.connect()?))
    }
}

impl<S: Read + Write> UsbmuxClient<S> {
    pub fn new(stream: S) -> Self {
        Self { stream, tag: 0 }
    }

    fn request(&mut self, message_type: &'static str, args: Dictionary) -> Result<Dictionary, DeviceError> {
        self.tag += 1;
        let mut message = dict([
            ("MessageType", Value::String(message_type.into())),
            ("ProgName", Value::String(PROG_NAME.into())),
            ("ClientVersionString", Value::String(CLIENT_VERSION.into())),
        ]);
        message.extend(args);

        let payload = plist_codec::encode_xml(&Value::Dictionary(message))?;
        self.stream.write_all(&encode_packet(self.tag, &payload)?)?;
        self.stream.flush()?;
        trace!(stage = "usbmux_write", message_type, tag = self.tag, "sent request");

        let (tag, payload) = read_packet(&mut self.stream)?;
        if tag != self.tag {
            return Err(DeviceError::Codec(format!(
                "usbmux reply tag {tag} does not match request {}",
                self.tag
            )));
        }
        plist_codec::decode_dict(&payload)
    }

    pub fn list_devices(mut self) -> Result<Vec<MuxDevice>, DeviceError> {
        let reply = self.request("ListDevices", Dictionary::new())?;
        let list = reply
            .get("DeviceList")
            .and_then(Value::as_array)
            .ok_or_else(|| DeviceError::Codec("ListDevices reply without DeviceList".into()))?;

        let devices: Vec<MuxDevice> = list
            .iter()
            .filter_map(Value::as_dictionary)
            .filter_map(parse_device_entry)
            .collect();
        debug!(count = devices.len(), "usbmuxd listed devices");
        Ok(devices)
    }

    /// Raw pair record plist for `udid`.
    pub fn read_pair_record(mut self, udid: &DeviceId) -> Result<Vec<u8>, DeviceError> {
        let reply = self.request(
            "ReadPairRecord",
            dict([("PairRecordID", Value::String(udid.to_string()))]),
        )?;
        check_result(&reply)?;
        reply
            .get("PairRecordData")
            .and_then(Value::as_data)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                DeviceError::TransportUnavailable(format!("no pair record for {udid}; is the device trusted?"))
            })
    }

    /// Tunnel to `port` on the device; the socket becomes the tunnel.
    pub fn connect_to(mut self, device_number: u32, port: u16) -> Result<S, DeviceError> {
        let reply = self.request(
            "Connect",
            dict([
                ("DeviceID", Value::Integer(u64::from(device_number).into())),
                ("PortNumber", Value::Integer(u64::from(wire_port(port)).into())),
            ]),
        )?;
        check_result(&reply)?;
        debug!(device_number, port, "usbmux tunnel established");
        Ok(self.stream)
    }
}

fn parse_device_entry(entry: &Dictionary) -> Option<MuxDevice> {
    let properties = entry.get("Properties").and_then(Value::as_dictionary)?;
    let number = entry
        .get("DeviceID")
        .or_else(|| properties.get("DeviceID"))
        .and_then(Value::as_unsigned_integer)
        .and_then(|n| u32::try_from(n).ok())?;
    let udid = string_at(properties, "SerialNumber")?;
    let connection = string_at(properties, "ConnectionType")
        .map(ConnectionKind::from_wire)
        .unwrap_or(ConnectionKind::Unknown);
    Some(MuxDevice {
        number,
        udid: DeviceId::new(udid),
        connection,
    })
}

/// `Result` replies carry `Number`; anything but 0 is a refusal.
fn check_result(reply: &Dictionary) -> Result<(), DeviceError> {
    if string_at(reply, "MessageType") != Some("Result") {
        return Ok(());
    }
    match reply.get("Number").and_then(Value::as_unsigned_integer) {
        Some(0) | None => Ok(()),
        Some(2) => Err(DeviceError::TransportUnavailable("device not attached".into())),
        Some(3) => Err(DeviceError::TransportUnavailable("connection refused by device".into())),
        Some(code) => Err(DeviceError::TransportUnavailable(format!("usbmuxd result {code}"))),
    }
}
