//! Core operation surface types.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::address::VirtualAddress;

/// File kind classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Anything else the native filesystem reports (sockets, devices, ...).
    Unknown,
}

impl FileKind {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileKind::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileKind::Directory)
    }

    /// Returns true if this is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        matches!(self, FileKind::Symlink)
    }
}

/// File metadata as reported by `stat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStat {
    /// Size in bytes.
    pub size: u64,
    /// File kind.
    pub kind: FileKind,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Creation time, where the native filesystem tracks one.
    pub ctime: Option<SystemTime>,
}

impl FileStat {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Directory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Entry kind.
    pub kind: FileKind,
}

/// Flags controlling `write_file` behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// Create the file if it does not exist.
    pub create: bool,
    /// Overwrite the file if it exists.
    pub overwrite: bool,
}

impl WriteOptions {
    /// Create if absent, fail if present.
    pub fn create_new() -> Self {
        Self {
            create: true,
            overwrite: false,
        }
    }

    /// Create if absent, overwrite if present.
    pub fn create_or_overwrite() -> Self {
        Self {
            create: true,
            overwrite: true,
        }
    }
}

/// Kind of filesystem change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Path was created.
    Created,
    /// Path contents changed.
    Changed,
    /// Path was removed.
    Deleted,
}

/// A normalized change notification, addressed virtually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Kind of change.
    pub kind: ChangeKind,
    /// Virtual address of the changed path.
    pub address: VirtualAddress,
}
