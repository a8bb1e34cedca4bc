use std::path::PathBuf;

use thiserror::Error;

const APP_DIR_NAME: &str = "docshare";

/// Environment variable that isolates data directories per profile.
pub const PROFILE_ENV: &str = "DOCSHARE_PROFILE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("platform local data directory is unavailable")]
    DataLocalDirUnavailable,
}

fn resolved_app_dir_name() -> String {
    match std::env::var(PROFILE_ENV) {
        Ok(profile) if !profile.is_empty() => format!("{APP_DIR_NAME}-{profile}"),
        _ => APP_DIR_NAME.to_string(),
    }
}

/// `<data_local_dir>/docshare[-<profile>]`. Not created here.
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let base = dirs::data_local_dir().ok_or(ConfigError::DataLocalDirUnavailable)?;
    Ok(app_data_dir_in(base))
}

pub fn app_data_dir_in(base: PathBuf) -> PathBuf {
    base.join(resolved_app_dir_name())
}
