//! # ds-infra
//!
//! Infrastructure adapters that touch the host machine directly: the local
//! filesystem collaborator, application directories and the config loader.

pub mod app_dirs;
pub mod config;
pub mod fs;

pub use app_dirs::{app_data_dir, ConfigError};
pub use config::{load_config, resolve_config};
pub use fs::StdLocalFs;
