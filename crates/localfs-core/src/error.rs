//! Filesystem error taxonomy.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Error type for all localfs operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// Target absent when presence is required.
    #[error("not found: {0}")]
    NotFound(String),

    /// Target present when absence is required and no overwrite was requested.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Containing directory absent.
    #[error("parent directory missing: {0}")]
    ParentMissing(String),

    /// Native access-control rejection.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Virtual address names a host with no mapping.
    #[error("unknown host: {0}")]
    UnknownHost(String),

    /// Real path is not under any mounted base directory.
    #[error("path not mounted: {0}")]
    PathNotMounted(String),

    /// Invalid registry argument (e.g. a relative mount path).
    #[error("registry error: {0}")]
    Registry(String),

    /// Any native failure not otherwise classified. Carries the original
    /// message for diagnostics.
    #[error("{0}")]
    Unknown(String),
}

impl FsError {
    /// Create a NotFound error.
    pub fn not_found(target: impl Into<String>) -> Self {
        Self::NotFound(target.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(target: impl Into<String>) -> Self {
        Self::AlreadyExists(target.into())
    }

    /// Create a ParentMissing error.
    pub fn parent_missing(dir: impl Into<String>) -> Self {
        Self::ParentMissing(dir.into())
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(target: impl Into<String>) -> Self {
        Self::PermissionDenied(target.into())
    }

    /// Create an UnknownHost error.
    pub fn unknown_host(host: impl Into<String>) -> Self {
        Self::UnknownHost(host.into())
    }

    /// Create a PathNotMounted error.
    pub fn path_not_mounted(path: &Path) -> Self {
        Self::PathNotMounted(path.display().to_string())
    }

    /// Create a Registry error.
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Create an Unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Classify a native I/O error for the given path.
    ///
    /// Recognized error kinds map to their taxonomy member; everything else
    /// lands in [`FsError::Unknown`] with the original message preserved.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        let target = path.display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(target),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(target),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(target),
            _ => Self::Unknown(format!("{err}: {target}")),
        }
    }
}

/// Result alias for localfs operations.
pub type FsResult<T> = Result<T, FsError>;
