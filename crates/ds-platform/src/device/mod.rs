//! Device transport over usbmuxd.
//!
//! One [`UsbmuxTransport`] serves every device. Each acquisition stage maps
//! to a socket of its own: the lockdown tunnel opened with the device
//! connection, the lockdown session on top of it, and a fresh tunnel per
//! started service. Dropping a stage closes its socket.

mod afc;
mod framing;
mod house_arrest;
mod installation_proxy;
mod lockdown;
mod pair_record;
mod plist_codec;
mod stream;
mod tls;
mod transport;
mod usbmux;

#[cfg(test)]
mod test_support;

pub use afc::AfcClient;
pub use lockdown::LOCKDOWN_PORT;
pub use pair_record::PairRecord;
pub use transport::{UsbmuxConnection, UsbmuxTransport};
pub use usbmux::{UsbmuxAddress, USBMUXD_ADDRESS_ENV};
