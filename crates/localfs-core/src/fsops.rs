//! Virtual filesystem operations.
//!
//! [`LocalFs`] implements the provider contract over the real filesystem:
//! each operation translates its virtual address(es), validates
//! existence/parent preconditions itself so expected failures surface as
//! specific taxonomy members, then performs the I/O through [`crate::raw`].

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::address::VirtualAddress;
use crate::error::{FsError, FsResult};
use crate::raw;
use crate::translate::PathTranslator;
use crate::types::{DirEntry, FileStat, WriteOptions};

/// The virtual-filesystem-provider contract.
///
/// Hosts register an implementation as a filesystem backend under the
/// `localfs` address scheme. All operations take virtual addresses; no
/// real path ever crosses this boundary.
#[async_trait]
pub trait FsProvider: Send + Sync {
    /// File metadata: size, times, kind.
    async fn stat(&self, address: &VirtualAddress) -> FsResult<FileStat>;

    /// Directory listing in native order.
    async fn read_directory(&self, address: &VirtualAddress) -> FsResult<Vec<DirEntry>>;

    /// Raw byte content of a file.
    async fn read_file(&self, address: &VirtualAddress) -> FsResult<Vec<u8>>;

    /// Write a file; see [`WriteOptions`] for create/overwrite semantics.
    async fn write_file(
        &self,
        address: &VirtualAddress,
        content: &[u8],
        options: WriteOptions,
    ) -> FsResult<()>;

    /// Create a directory. The parent must exist; the target must not.
    async fn create_directory(&self, address: &VirtualAddress) -> FsResult<()>;

    /// Remove a file or directory tree.
    async fn delete(&self, address: &VirtualAddress) -> FsResult<()>;

    /// Move `source` to `target`.
    async fn rename(
        &self,
        source: &VirtualAddress,
        target: &VirtualAddress,
        overwrite: bool,
    ) -> FsResult<()>;

    /// Copy `source` bytes to `target`, preserving the source.
    async fn copy(
        &self,
        source: &VirtualAddress,
        target: &VirtualAddress,
        overwrite: bool,
    ) -> FsResult<()>;
}

/// Provider backed by the local filesystem through the path translator.
pub struct LocalFs {
    translator: Arc<PathTranslator>,
}

impl LocalFs {
    /// Create a provider over the given translator.
    pub fn new(translator: Arc<PathTranslator>) -> Self {
        Self { translator }
    }

    async fn assert_exists(&self, address: &VirtualAddress, real: &Path) -> FsResult<()> {
        if raw::exists(real).await {
            Ok(())
        } else {
            Err(FsError::not_found(address.to_string()))
        }
    }

    async fn assert_parent_exists(real: &Path) -> FsResult<()> {
        match real.parent() {
            Some(parent) if raw::exists(parent).await => Ok(()),
            Some(parent) => Err(FsError::parent_missing(parent.display().to_string())),
            None => Err(FsError::parent_missing(real.display().to_string())),
        }
    }
}

#[async_trait]
impl FsProvider for LocalFs {
    async fn stat(&self, address: &VirtualAddress) -> FsResult<FileStat> {
        tracing::debug!(address = %address, "stat");
        let real = self.translator.to_real_path(address)?;
        self.assert_exists(address, &real).await?;
        raw::stat(&real).await
    }

    async fn read_directory(&self, address: &VirtualAddress) -> FsResult<Vec<DirEntry>> {
        tracing::debug!(address = %address, "read_directory");
        let real = self.translator.to_real_path(address)?;
        self.assert_exists(address, &real).await?;
        raw::read_dir(&real).await
    }

    async fn read_file(&self, address: &VirtualAddress) -> FsResult<Vec<u8>> {
        tracing::debug!(address = %address, "read_file");
        let real = self.translator.to_real_path(address)?;
        self.assert_exists(address, &real).await?;
        raw::read(&real).await
    }

    async fn write_file(
        &self,
        address: &VirtualAddress,
        content: &[u8],
        options: WriteOptions,
    ) -> FsResult<()> {
        tracing::debug!(address = %address, create = options.create, overwrite = options.overwrite, "write_file");
        let real = self.translator.to_real_path(address)?;

        if raw::exists(&real).await {
            if options.overwrite {
                raw::write(&real, content).await
            } else {
                Err(FsError::already_exists(address.to_string()))
            }
        } else if options.create {
            Self::assert_parent_exists(&real).await?;
            raw::write(&real, content).await
        } else {
            Err(FsError::not_found(address.to_string()))
        }
    }

    async fn create_directory(&self, address: &VirtualAddress) -> FsResult<()> {
        tracing::debug!(address = %address, "create_directory");
        let real = self.translator.to_real_path(address)?;
        Self::assert_parent_exists(&real).await?;
        if raw::exists(&real).await {
            return Err(FsError::already_exists(address.to_string()));
        }
        raw::mkdir(&real).await
    }

    async fn delete(&self, address: &VirtualAddress) -> FsResult<()> {
        tracing::debug!(address = %address, "delete");
        let real = self.translator.to_real_path(address)?;
        self.assert_exists(address, &real).await?;
        raw::remove(&real).await
    }

    async fn rename(
        &self,
        source: &VirtualAddress,
        target: &VirtualAddress,
        overwrite: bool,
    ) -> FsResult<()> {
        tracing::debug!(source = %source, target = %target, "rename");
        let from = self.translator.to_real_path(source)?;
        let to = self.translator.to_real_path(target)?;

        self.assert_exists(source, &from).await?;
        Self::assert_parent_exists(&to).await?;
        if raw::exists(&to).await && !overwrite {
            return Err(FsError::already_exists(target.to_string()));
        }
        raw::rename(&from, &to).await
    }

    async fn copy(
        &self,
        source: &VirtualAddress,
        target: &VirtualAddress,
        overwrite: bool,
    ) -> FsResult<()> {
        tracing::debug!(source = %source, target = %target, "copy");
        let from = self.translator.to_real_path(source)?;
        let to = self.translator.to_real_path(target)?;

        self.assert_exists(source, &from).await?;
        Self::assert_parent_exists(&to).await?;
        if raw::exists(&to).await && !overwrite {
            return Err(FsError::already_exists(target.to_string()));
        }
        raw::copy(&from, &to).await
    }
}
