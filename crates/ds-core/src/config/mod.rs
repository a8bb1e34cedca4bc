//! # Pure Data Module - Data Transfer Objects Only
//!
//! ## Responsibilities
//!
//! - Define configuration data structures
//! - Provide TOML → DTO mapping
//!
//! ## Prohibited
//!
//! - No business logic or policies
//! - No validation logic
//!
//! Missing keys map to the documented defaults; an empty string is a valid
//! fact and means "let the adapter decide".

use std::path::PathBuf;

/// Label sent during the device session handshake.
pub const DEFAULT_CLIENT_LABEL: &str = "docshare";

/// Seconds between device discovery scans.
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 3;

/// Application configuration DTO (pure data, no logic)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Label identifying this client to the device
    pub client_label: String,

    /// Discovery scan interval in seconds
    pub scan_interval_secs: u64,

    /// usbmuxd socket path or `host:port` (empty = platform default)
    pub usbmuxd_address: String,

    /// Directory holding `<udid>.plist` pair records (empty = ask usbmuxd)
    pub pair_record_dir: PathBuf,

    /// Default local destination for downloads
    pub download_dir: PathBuf,

    /// Log directory
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Create AppConfig from TOML value
    pub fn from_toml(toml_value: &toml::Value) -> Self {
        let device = toml_value.get("device");
        let str_at = |section: Option<&toml::Value>, key: &str| {
            section
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };

        let client_label = match str_at(device, "client_label") {
            label if label.is_empty() => DEFAULT_CLIENT_LABEL.to_string(),
            label => label,
        };

        Self {
            client_label,
            scan_interval_secs: device
                .and_then(|d| d.get("scan_interval_secs"))
                .and_then(|v| v.as_integer())
                .map(|v| v.max(1) as u64)
                .unwrap_or(DEFAULT_SCAN_INTERVAL_SECS),
            usbmuxd_address: str_at(device, "usbmuxd_address"),
            pair_record_dir: PathBuf::from(str_at(device, "pair_record_dir")),
            download_dir: PathBuf::from(str_at(toml_value.get("storage"), "download_dir")),
            log_dir: PathBuf::from(str_at(toml_value.get("logging"), "log_dir")),
        }
    }

    /// Create AppConfig with system-default paths for production use
    ///
    /// The base directory should be computed by the caller using
    /// platform-specific logic (e.g., `dirs` crate).
    pub fn with_system_defaults(data_dir: PathBuf) -> Self {
        Self {
            client_label: DEFAULT_CLIENT_LABEL.to_string(),
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            usbmuxd_address: String::new(),
            pair_record_dir: PathBuf::new(),
            download_dir: data_dir.join("downloads"),
            log_dir: data_dir.join("logs"),
        }
    }

    /// Fill empty paths from `defaults`.
    pub fn or_defaults(mut self, defaults: &AppConfig) -> Self {
        if self.download_dir.as_os_str().is_empty() {
            self.download_dir = defaults.download_dir.clone();
        }
        if self.log_dir.as_os_str().is_empty() {
            self.log_dir = defaults.log_dir.clone();
        }
        self
    }
}
