//! Thin, stateless wrappers over native file I/O.
//!
//! Every wrapper classifies native errors through [`FsError::from_io`] so
//! permission failures surface as `PermissionDenied` and anything
//! unrecognized lands in `Unknown` with the original message preserved.
//! Precondition checks (existence, parent existence) belong to the caller.

use std::path::Path;
use std::time::SystemTime;
use tokio::fs;

use crate::error::{FsError, FsResult};
use crate::types::{DirEntry, FileKind, FileStat};

/// Stat a path without following a final symlink.
pub async fn stat(path: &Path) -> FsResult<FileStat> {
    let meta = fs::symlink_metadata(path)
        .await
        .map_err(|e| FsError::from_io(e, path))?;
    Ok(FileStat {
        size: meta.len(),
        kind: file_kind(&meta.file_type()),
        mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        ctime: meta.created().ok(),
    })
}

/// Read the full byte content of a file.
pub async fn read(path: &Path) -> FsResult<Vec<u8>> {
    fs::read(path).await.map_err(|e| FsError::from_io(e, path))
}

/// Write bytes to a file, creating or truncating it.
pub async fn write(path: &Path, data: &[u8]) -> FsResult<()> {
    fs::write(path, data)
        .await
        .map_err(|e| FsError::from_io(e, path))
}

/// List a directory in native listing order.
pub async fn read_dir(path: &Path) -> FsResult<Vec<DirEntry>> {
    let mut dir = fs::read_dir(path)
        .await
        .map_err(|e| FsError::from_io(e, path))?;

    let mut entries = Vec::new();
    while let Some(entry) = dir
        .next_entry()
        .await
        .map_err(|e| FsError::from_io(e, path))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| FsError::from_io(e, path))?;
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind: file_kind(&file_type),
        });
    }
    Ok(entries)
}

/// Create a single directory. The parent must already exist.
pub async fn mkdir(path: &Path) -> FsResult<()> {
    fs::create_dir(path)
        .await
        .map_err(|e| FsError::from_io(e, path))
}

/// Rename a file or directory. Atomic where the native layer provides it.
pub async fn rename(from: &Path, to: &Path) -> FsResult<()> {
    // NotFound names the source: a missing target parent is the caller's
    // precondition, so the vanished path here is `from`.
    fs::rename(from, to).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FsError::from_io(e, from),
        _ => FsError::from_io(e, to),
    })
}

/// Copy file bytes from `from` to `to`. Read-then-write, not atomic.
pub async fn copy(from: &Path, to: &Path) -> FsResult<()> {
    let bytes = read(from).await?;
    write(to, &bytes).await
}

/// Remove a file, or a directory tree if the path is a directory.
pub async fn remove(path: &Path) -> FsResult<()> {
    let meta = fs::symlink_metadata(path)
        .await
        .map_err(|e| FsError::from_io(e, path))?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
            .await
            .map_err(|e| FsError::from_io(e, path))
    } else {
        fs::remove_file(path)
            .await
            .map_err(|e| FsError::from_io(e, path))
    }
}

/// Check whether a path exists. Errors count as absent.
pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

fn file_kind(file_type: &std::fs::FileType) -> FileKind {
    if file_type.is_symlink() {
        FileKind::Symlink
    } else if file_type.is_dir() {
        FileKind::Directory
    } else if file_type.is_file() {
        FileKind::File
    } else {
        FileKind::Unknown
    }
}
