use std::fmt::{self, Display};
use std::path::PathBuf;
use thiserror::Error;

/// Status code carried by a file-access channel status reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAccessStatus {
    Success,
    UnknownError,
    InvalidArgument,
    ObjectNotFound,
    ObjectIsDirectory,
    PermissionDenied,
    ObjectExists,
    ObjectBusy,
    NoSpaceLeft,
    DirectoryNotEmpty,
    IoError,
    Other(u64),
}

impl FileAccessStatus {
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => FileAccessStatus::Success,
            1 => FileAccessStatus::UnknownError,
            7 => FileAccessStatus::InvalidArgument,
            8 => FileAccessStatus::ObjectNotFound,
            9 => FileAccessStatus::ObjectIsDirectory,
            10 => FileAccessStatus::PermissionDenied,
            16 => FileAccessStatus::ObjectExists,
            17 => FileAccessStatus::ObjectBusy,
            18 => FileAccessStatus::NoSpaceLeft,
            20 => FileAccessStatus::IoError,
            33 => FileAccessStatus::DirectoryNotEmpty,
            other => FileAccessStatus::Other(other),
        }
    }

    pub fn code(&self) -> u64 {
        match self {
            FileAccessStatus::Success => 0,
            FileAccessStatus::UnknownError => 1,
            FileAccessStatus::InvalidArgument => 7,
            FileAccessStatus::ObjectNotFound => 8,
            FileAccessStatus::ObjectIsDirectory => 9,
            FileAccessStatus::PermissionDenied => 10,
            FileAccessStatus::ObjectExists => 16,
            FileAccessStatus::ObjectBusy => 17,
            FileAccessStatus::NoSpaceLeft => 18,
            FileAccessStatus::IoError => 20,
            FileAccessStatus::DirectoryNotEmpty => 33,
            FileAccessStatus::Other(code) => *code,
        }
    }
}

impl Display for FileAccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileAccessStatus::Other(code) => write!(f, "status {code}"),
            known => write!(f, "{known:?} ({})", known.code()),
        }
    }
}

/// Failures raised by device-transport adapters.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Device session could not be opened (unplugged, not paired, daemon down).
    #[error("device transport unavailable: {0}")]
    TransportUnavailable(String),

    /// A named service refused to activate.
    #[error("service {service} unavailable: {reason}")]
    ServiceUnavailable { service: String, reason: String },

    /// A file-access primitive answered with a non-success status.
    #[error("{op} failed with {status}")]
    Protocol {
        op: &'static str,
        status: FileAccessStatus,
    },

    /// The peer sent something that does not decode.
    #[error("malformed response: {0}")]
    Codec(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeviceError {
    pub fn status(&self) -> Option<FileAccessStatus> {
        match self {
            DeviceError::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures raised by the local filesystem collaborator.
#[derive(Debug, Error)]
pub enum LocalFsError {
    #[error("not found: {0}")]
    NotFound(PathBuf),

    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("failed to move {path} to trash: {reason}")]
    Trash { path: PathBuf, reason: String },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LocalFsError {
    /// Classify a std I/O error raised while touching `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => LocalFsError::NotFound(path),
            std::io::ErrorKind::AlreadyExists => LocalFsError::AlreadyExists(path),
            _ => LocalFsError::Io { path, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for code in [0u64, 1, 7, 8, 9, 10, 16, 17, 18, 20, 33, 99] {
            assert_eq!(FileAccessStatus::from_code(code).code(), code);
        }
    }

    #[test]
    fn protocol_error_exposes_status() {
        let err = DeviceError::Protocol {
            op: "make_directory",
            status: FileAccessStatus::ObjectExists,
        };
        assert_eq!(err.status(), Some(FileAccessStatus::ObjectExists));
        assert!(err.to_string().contains("make_directory"));
    }

    #[test]
    fn io_not_found_is_classified() {
        let err = LocalFsError::from_io(
            "/tmp/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, LocalFsError::NotFound(_)));
    }
}
