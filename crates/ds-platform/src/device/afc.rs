//! Apple File Conduit client.
//!
//! Every packet starts with a 40-byte little-endian header:
//!
//! ```text
//! magic "CFA6LPAA" | entire_len u64 | this_len u64 | packet_num u64 | operation u64
//! ```
//!
//! `this_len` covers the header plus fixed header data; anything after it up
//! to `entire_len` is payload. Replies are either a `STATUS` packet carrying a
//! u64 code or an operation-specific data packet.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use ds_core::ports::{DeviceError, FileAccessPort, FileAccessStatus, FileHandle, OpenMode};
use tracing::trace;

use super::stream::ServiceStream;

const MAGIC: &[u8; 8] = b"CFA6LPAA";
const HEADER_LEN: usize = 40;
const MAX_REPLY_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum Operation {
    Status = 0x01,
    Data = 0x02,
    ReadDir = 0x03,
    RemovePath = 0x08,
    MakeDir = 0x09,
    GetFileInfo = 0x0A,
    FileOpen = 0x0D,
    FileOpenResult = 0x0E,
    FileRead = 0x0F,
    FileWrite = 0x10,
    FileClose = 0x14,
}

impl Operation {
    fn from_code(code: u64) -> Option<Self> {
        use Operation::*;
        [
            Status, Data, ReadDir, RemovePath, MakeDir, GetFileInfo, FileOpen, FileOpenResult,
            FileRead, FileWrite, FileClose,
        ]
        .into_iter()
        .find(|op| *op as u64 == code)
    }
}

fn open_mode_code(mode: OpenMode) -> u64 {
    match mode {
        OpenMode::ReadOnly => 1,
        OpenMode::WriteTruncate => 3,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub entire_len: u64,
    pub this_len: u64,
    pub packet_num: u64,
    pub operation: u64,
}

impl Header {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..8].copy_from_slice(MAGIC);
        out[8..16].copy_from_slice(&self.entire_len.to_le_bytes());
        out[16..24].copy_from_slice(&self.this_len.to_le_bytes());
        out[24..32].copy_from_slice(&self.packet_num.to_le_bytes());
        out[32..40].copy_from_slice(&self.operation.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8; HEADER_LEN]) -> Result<Self, DeviceError> {
        if &bytes[..8] != MAGIC {
            return Err(DeviceError::Codec("bad AFC magic".into()));
        }
        let word = |i: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[i..i + 8]);
            u64::from_le_bytes(raw)
        };
        let header = Self {
            entire_len: word(8),
            this_len: word(16),
            packet_num: word(24),
            operation: word(32),
        };
        if header.entire_len < HEADER_LEN as u64 || header.this_len > header.entire_len {
            return Err(DeviceError::Codec(format!(
                "bad AFC lengths {}/{}",
                header.this_len, header.entire_len
            )));
        }
        Ok(header)
    }
}

/// Decoded reply: operation plus everything after the header.
struct Reply {
    operation: Operation,
    body: Vec<u8>,
}

pub struct AfcClient<S: Read + Write + Send = ServiceStream> {
    stream: S,
    packet_num: u64,
}

impl<S: Read + Write + Send> AfcClient<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            packet_num: 0,
        }
    }

    fn send(&mut self, operation: Operation, header_data: &[u8], payload: &[u8]) -> Result<(), DeviceError> {
        let this_len = (HEADER_LEN + header_data.len()) as u64;
        let header = Header {
            entire_len: this_len + payload.len() as u64,
            this_len,
            packet_num: self.packet_num,
            operation: operation as u64,
        };
        self.packet_num += 1;
        trace!(?operation, packet = header.packet_num, len = header.entire_len, "afc send");

        self.stream.write_all(&header.encode())?;
        self.stream.write_all(header_data)?;
        self.stream.write_all(payload)?;
        self.stream.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Reply, DeviceError> {
        let mut raw = [0u8; HEADER_LEN];
        self.stream.read_exact(&mut raw)?;
        let header = Header::decode(&raw)?;
        let body_len = header.entire_len - HEADER_LEN as u64;
        if body_len > MAX_REPLY_BYTES {
            return Err(DeviceError::Codec(format!("AFC reply of {body_len} bytes")));
        }
        let mut body = vec![0u8; body_len as usize];
        self.stream.read_exact(&mut body)?;

        let operation = Operation::from_code(header.operation).ok_or_else(|| {
            DeviceError::Codec(format!("unknown AFC operation {:#x}", header.operation))
        })?;
        Ok(Reply { operation, body })
    }

    /// One request/reply exchange. A non-zero status becomes
    /// [`DeviceError::Protocol`]; a zero status yields an empty body.
    fn exchange(
        &mut self,
        op_name: &'static str,
        operation: Operation,
        header_data: &[u8],
        payload: &[u8],
    ) -> Result<Reply, DeviceError> {
        self.send(operation, header_data, payload)?;
        let reply = self.receive()?;
        if reply.operation == Operation::Status {
            let code = first_u64(&reply.body)
                .ok_or_else(|| DeviceError::Codec("short AFC status".into()))?;
            if code != 0 {
                return Err(DeviceError::Protocol {
                    op: op_name,
                    status: FileAccessStatus::from_code(code),
                });
            }
            return Ok(Reply {
                operation: Operation::Status,
                body: Vec::new(),
            });
        }
        Ok(reply)
    }

    fn expect(reply: Reply, expected: Operation) -> Result<Vec<u8>, DeviceError> {
        if reply.operation != expected {
            return Err(DeviceError::Codec(format!(
                "expected {expected:?}, got {:?}",
                reply.operation
            )));
        }
        Ok(reply.body)
    }
}

fn first_u64(body: &[u8]) -> Option<u64> {
    let raw: [u8; 8] = body.get(..8)?.try_into().ok()?;
    Some(u64::from_le_bytes(raw))
}

fn path_bytes(path: &str) -> Vec<u8> {
    let mut bytes = path.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

fn split_strings(body: &[u8]) -> Vec<String> {
    body.split(|b| *b == 0)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect()
}

impl<S: Read + Write + Send> FileAccessPort for AfcClient<S> {
    fn read_directory(&mut self, path: &str) -> Result<Vec<String>, DeviceError> {
        let reply = self.exchange("read_directory", Operation::ReadDir, &path_bytes(path), &[])?;
        let body = Self::expect(reply, Operation::Data)?;
        Ok(split_strings(&body))
    }

    fn file_info(&mut self, path: &str) -> Result<BTreeMap<String, String>, DeviceError> {
        let reply = self.exchange("file_info", Operation::GetFileInfo, &path_bytes(path), &[])?;
        let body = Self::expect(reply, Operation::Data)?;
        let strings = split_strings(&body);
        Ok(strings
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect())
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<FileHandle, DeviceError> {
        let mut header_data = open_mode_code(mode).to_le_bytes().to_vec();
        header_data.extend_from_slice(&path_bytes(path));
        let reply = self.exchange("open", Operation::FileOpen, &header_data, &[])?;
        let body = Self::expect(reply, Operation::FileOpenResult)?;
        first_u64(&body)
            .map(FileHandle)
            .ok_or_else(|| DeviceError::Codec("short AFC open reply".into()))
    }

    fn read(&mut self, handle: FileHandle, len: usize) -> Result<Vec<u8>, DeviceError> {
        let mut header_data = handle.0.to_le_bytes().to_vec();
        header_data.extend_from_slice(&(len as u64).to_le_bytes());
        let reply = self.exchange("read", Operation::FileRead, &header_data, &[])?;
        match reply.operation {
            // zero status: nothing left
            Operation::Status => Ok(Vec::new()),
            _ => Self::expect(reply, Operation::Data),
        }
    }

    fn write(&mut self, handle: FileHandle, data: &[u8]) -> Result<(), DeviceError> {
        self.exchange("write", Operation::FileWrite, &handle.0.to_le_bytes(), data)
            .map(|_| ())
    }

    fn close(&mut self, handle: FileHandle) -> Result<(), DeviceError> {
        self.exchange("close", Operation::FileClose, &handle.0.to_le_bytes(), &[])
            .map(|_| ())
    }

    fn remove(&mut self, path: &str) -> Result<(), DeviceError> {
        self.exchange("remove", Operation::RemovePath, &path_bytes(path), &[])
            .map(|_| ())
    }

    fn make_directory(&mut self, path: &str) -> Result<(), DeviceError> {
        self.exchange("make_directory", Operation::MakeDir, &path_bytes(path), &[])
            .map(|_| ())
    }
}
