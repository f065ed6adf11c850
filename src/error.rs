//! Error type shared by every layer operation.

use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::WindowHandle;

#[derive(Debug, Error)]
pub enum LayerError {
    /// Neither the direct child lookup nor the sibling fallback found the background window.
    #[error("background window not found under the desktop owner or as a sibling of the icons host")]
    HierarchyNotFound,

    #[error("desktop owner window ({0}) not found")]
    DesktopOwnerNotFound(&'static str),

    #[error("no surface has been embedded yet")]
    NotEmbedded,

    #[error("surface {0} is already embedded; only one surface per process is supported")]
    AlreadyEmbedded(WindowHandle),

    #[error("desktop icon list view not found")]
    IconListNotFound,

    #[error("{call} failed: {message}")]
    Os { call: &'static str, message: String },

    #[error("message 0x{message:04X} timed out after {timeout_ms} ms")]
    Timeout { message: u32, timeout_ms: u32 },

    #[error("failed to read settings {}: {source}", path.display())]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    SettingsParse(#[from] serde_json::Error),
}

impl LayerError {
    pub fn os(call: &'static str, message: impl ToString) -> Self {
        LayerError::Os {
            call,
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LayerError>;
