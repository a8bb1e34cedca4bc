//! Length-delimited plist framing used by lockdown and the services it
//! starts (installation proxy, house arrest before AFC takes over).

use std::io::{self, Read, Write};

use ds_core::ports::DeviceError;
use plist::{Dictionary, Value};
use tracing::{trace, warn};

use super::plist_codec;

/// Maximum frame size accepted from a device service (16 MiB).
pub const MAX_SERVICE_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Write a big-endian length-prefixed payload.
pub fn write_length_prefixed<W>(writer: &mut W, payload: &[u8]) -> Result<(), DeviceError>
where
    W: Write + ?Sized,
{
    let len: u32 = payload
        .len()
        .try_into()
        .map_err(|_| DeviceError::Codec(format!("frame too large for u32: {} bytes", payload.len())))?;

    trace!(stage = "write_len_prefix", len, "writing frame length");
    writer.write_all(&len.to_be_bytes())?;

    trace!(stage = "write_payload", len, "writing frame payload");
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one big-endian length-prefixed frame, enforcing `max_frame_bytes`.
pub fn read_length_prefixed<R>(reader: &mut R, max_frame_bytes: usize) -> Result<Vec<u8>, DeviceError>
where
    R: Read + ?Sized,
{
    let mut len_buf = [0u8; 4];
    trace!(stage = "read_len_prefix", "reading frame length");
    if let Err(e) = reader.read_exact(&mut len_buf) {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            warn!(stage = "read_len_prefix", error = %e, expected = 4, "unexpected eof reading length");
            return Err(DeviceError::TransportUnavailable("service closed the stream".into()));
        }
        return Err(e.into());
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_frame_bytes {
        return Err(DeviceError::Codec(format!(
            "frame exceeds max: {len} > {max_frame_bytes}"
        )));
    }

    let mut buf = vec![0u8; len];
    trace!(stage = "read_payload", len, "reading frame payload");
    if let Err(e) = reader.read_exact(&mut buf) {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            warn!(stage = "read_payload", error = %e, expected = len, "unexpected eof reading payload");
        }
        return Err(e.into());
    }
    Ok(buf)
}

pub fn send_plist<W>(writer: &mut W, message: Dictionary) -> Result<(), DeviceError>
where
    W: Write + ?Sized,
{
    let payload = plist_codec::encode_xml(&Value::Dictionary(message))?;
    write_length_prefixed(writer, &payload)
}

pub fn recv_plist<R>(reader: &mut R) -> Result<Dictionary, DeviceError>
where
    R: Read + ?Sized,
{
    let frame = read_length_prefixed(reader, MAX_SERVICE_FRAME_BYTES)?;
    plist_codec::decode_dict(&frame)
}
