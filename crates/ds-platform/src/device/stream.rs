//! Byte streams to the device: raw usbmuxd tunnels, optionally wrapped in TLS.

use std::io::{self, Read, Write};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

use rustls::{ClientConnection, StreamOwned};

/// Socket to usbmuxd. After a successful `Connect` it is a raw tunnel to a
/// device port.
#[derive(Debug)]
pub enum MuxStream {
    #[cfg(unix)]
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl Read for MuxStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            #[cfg(unix)]
            MuxStream::Unix(s) => s.read(buf),
            MuxStream::Tcp(s) => s.read(buf),
        }
    }
}

impl Write for MuxStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            #[cfg(unix)]
            MuxStream::Unix(s) => s.write(buf),
            MuxStream::Tcp(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            #[cfg(unix)]
            MuxStream::Unix(s) => s.flush(),
            MuxStream::Tcp(s) => s.flush(),
        }
    }
}

/// A service connection, plain or TLS-wrapped depending on what the device
/// asked for.
pub enum ServiceStream {
    Plain(MuxStream),
    Tls(Box<StreamOwned<ClientConnection, MuxStream>>),
}

impl Read for ServiceStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ServiceStream::Plain(s) => s.read(buf),
            ServiceStream::Tls(s) => s.read(buf),
        }
    }
}

impl Write for ServiceStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ServiceStream::Plain(s) => s.write(buf),
            ServiceStream::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ServiceStream::Plain(s) => s.flush(),
            ServiceStream::Tls(s) => s.flush(),
        }
    }
}
