//! DocShare platform adapters
//!
//! - [`device`]: the device transport, speaking the usbmuxd, lockdown,
//!   installation-proxy, house-arrest and AFC protocols over blocking sockets
//! - [`notify`]: [`ds_core::ports::NotificationPort`] adapters

pub mod device;
pub mod notify;

pub use device::{UsbmuxAddress, UsbmuxTransport};
pub use notify::{ChannelNotifier, TracingNotifier};
