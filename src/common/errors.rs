use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Run-level errors for imgdedup.
/// We use `anyhow` at the top level for CLI error handling,
/// but these typed errors allow modules to be precise about failures.
#[derive(Debug, Error)]
pub enum DedupError {
    /// Invalid or unusable configuration; always fatal, raised before any file is touched
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File system operation failed
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Report or contact sheet could not be written
    #[error("Report error for '{}': {message}", path.display())]
    Report { path: PathBuf, message: String },
}

impl DedupError {
    pub fn config(message: impl Into<String>) -> Self {
        DedupError::Config {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DedupError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a single image could not be loaded.
///
/// Carried as data on the record so one bad file never stops the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LoadError {
    #[error("file is empty")]
    Empty,

    #[error("permission denied")]
    PermissionDenied,

    #[error("read failed: {0}")]
    Io(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => LoadError::PermissionDenied,
            _ => LoadError::Io(e.to_string()),
        }
    }
}

impl From<image::ImageError> for LoadError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => LoadError::from(io),
            other => LoadError::Decode(other.to_string()),
        }
    }
}

/// A move or delete that failed during the apply phase.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ApplyError {
    #[error("source no longer exists")]
    SourceMissing,

    #[error("permission denied")]
    PermissionDenied,

    #[error("{0}")]
    Io(String),
}

impl From<std::io::Error> for ApplyError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => ApplyError::PermissionDenied,
            std::io::ErrorKind::NotFound => ApplyError::SourceMissing,
            _ => ApplyError::Io(e.to_string()),
        }
    }
}
