//! DocShare: browse and transfer the documents that file-sharing apps expose
//! on USB-attached handheld devices.
//!
//! The binary is a headless host for [`ds_app::BrowserRuntime`]; front ends
//! drive it through [`ds_app::CoreHandle`].

pub mod bootstrap;
