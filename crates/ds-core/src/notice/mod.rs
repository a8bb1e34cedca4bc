//! Short user-facing messages handed to the reporting surface.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Summary for a finished batch: success when nothing failed.
    pub fn batch(verb: &str, succeeded: usize, requested: usize) -> Self {
        let message = format!("{verb} {succeeded} of {requested} items");
        if succeeded == requested {
            Self::success(message)
        } else {
            Self::error(message)
        }
    }
}
