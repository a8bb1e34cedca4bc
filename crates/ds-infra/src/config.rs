//! # Configuration Loader
//!
//! ## Responsibilities
//!
//! - Read TOML configuration files
//! - Parse TOML into the AppConfig DTO
//! - Report I/O and parsing errors with context
//!
//! Defaults come from [`AppConfig`] itself; nothing here validates values.

use anyhow::Context;
use std::path::{Path, PathBuf};

use ds_core::config::AppConfig;
use tracing::{debug, info};

use crate::app_dirs::app_data_dir;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    Ok(AppConfig::from_toml(&toml_value))
}

/// Config for the running process: `config_path` if it exists, system
/// defaults otherwise. Empty paths are filled from the data directory.
pub fn resolve_config(config_path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let data_dir = app_data_dir().context("Failed to resolve application data directory")?;
    let defaults = AppConfig::with_system_defaults(data_dir);

    match config_path {
        Some(path) if path.exists() => {
            info!(path = %path.display(), "loading config");
            Ok(load_config(&path)?.or_defaults(&defaults))
        }
        Some(path) => {
            debug!(path = %path.display(), "config file not found; using defaults");
            Ok(defaults)
        }
        None => Ok(defaults),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_reads_valid_toml() {
        let toml_content = r#"
            [device]
            client_label = "desk"
            scan_interval_secs = 10
            pair_record_dir = "/var/lib/lockdown"

            [logging]
            log_dir = "/tmp/ds-logs"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config(temp_file.path()).unwrap();

        assert_eq!(config.client_label, "desk");
        assert_eq!(config.scan_interval_secs, 10);
        assert_eq!(config.pair_record_dir, PathBuf::from("/var/lib/lockdown"));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/ds-logs"));
    }

    #[test]
    fn test_load_config_fails_on_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[device\nclient_label = ").unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config as TOML"));
    }

    #[test]
    fn test_load_config_fails_when_file_missing() {
        let err = load_config(Path::new("/nonexistent/docshare.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_resolve_config_falls_back_to_defaults() {
        let config = resolve_config(Some(PathBuf::from("/nonexistent/docshare.toml"))).unwrap();
        assert!(config.download_dir.ends_with("downloads"));
        assert_eq!(config.scan_interval_secs, 3);
    }
}
