//! Bidirectional translation between virtual addresses and real paths.
//!
//! Translation is lexical: `.` and `..` segments are folded without
//! touching the filesystem, so the round-trip law holds for paths that do
//! not exist yet. A relative path that would climb above its mount base is
//! rejected, never clamped past the root.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::address::VirtualAddress;
use crate::error::{FsError, FsResult};
use crate::registry::HostRegistry;

/// Converts virtual addresses to real paths and back via the registry.
#[derive(Debug)]
pub struct PathTranslator {
    registry: Arc<HostRegistry>,
}

impl PathTranslator {
    /// Create a translator over the given registry.
    pub fn new(registry: Arc<HostRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this translator resolves against.
    pub fn registry(&self) -> &Arc<HostRegistry> {
        &self.registry
    }

    /// Resolve a virtual address to the real path it names.
    ///
    /// Fails with [`FsError::UnknownHost`] if no mapping exists for the
    /// host, and with [`FsError::PermissionDenied`] if the address would
    /// escape the mount base via `..`.
    pub fn to_real_path(&self, address: &VirtualAddress) -> FsResult<PathBuf> {
        let base = self
            .registry
            .resolve_by_host(address.host())
            .ok_or_else(|| FsError::unknown_host(address.host()))?;

        let mut relative: Vec<&str> = Vec::new();
        for segment in address.segments() {
            match segment.as_str() {
                "" | "." => {}
                ".." => {
                    if relative.pop().is_none() {
                        return Err(FsError::permission_denied(format!(
                            "address escapes mount root: {address}"
                        )));
                    }
                }
                seg => relative.push(seg),
            }
        }

        let mut real = base;
        for seg in relative {
            real.push(seg);
        }
        Ok(real)
    }

    /// Derive the virtual address of a real path.
    ///
    /// Fails with [`FsError::PathNotMounted`] when no mapping's base
    /// directory is a prefix of the path. Nested mounts resolve to the
    /// longest matching base.
    pub fn to_virtual_address(&self, real: &Path) -> FsResult<VirtualAddress> {
        let mapping = self
            .registry
            .resolve_by_path(real)
            .ok_or_else(|| FsError::path_not_mounted(real))?;

        let relative = real
            .strip_prefix(&mapping.base_dir)
            .map_err(|_| FsError::path_not_mounted(real))?;

        let segments = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        Ok(VirtualAddress::from_parts(mapping.host, segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    fn setup() -> (PathTranslator, String, TempDir) {
        let registry = Arc::new(HostRegistry::open(Arc::new(MemoryStore::new())).unwrap());
        let dir = TempDir::new().unwrap();
        let host = registry.mount(dir.path()).unwrap();
        (PathTranslator::new(registry), host, dir)
    }

    #[test]
    fn test_to_real_path() {
        let (translator, host, dir) = setup();
        let base = dunce::canonicalize(dir.path()).unwrap();

        let addr = VirtualAddress::root(&host).join("src/main.rs");
        let real = translator.to_real_path(&addr).unwrap();
        assert_eq!(real, base.join("src").join("main.rs"));

        let root = translator.to_real_path(&VirtualAddress::root(&host)).unwrap();
        assert_eq!(root, base);
    }

    #[test]
    fn test_unknown_host() {
        let (translator, _host, _dir) = setup();
        let err = translator
            .to_real_path(&VirtualAddress::root("nosuch"))
            .unwrap_err();
        assert!(matches!(err, FsError::UnknownHost(_)));
    }

    #[test]
    fn test_dot_segments_folded() {
        let (translator, host, dir) = setup();
        let base = dunce::canonicalize(dir.path()).unwrap();

        let addr = VirtualAddress::root(&host).join("a/./b/../c.txt");
        let real = translator.to_real_path(&addr).unwrap();
        assert_eq!(real, base.join("a").join("c.txt"));
    }

    #[test]
    fn test_escape_rejected() {
        let (translator, host, _dir) = setup();

        let addr = VirtualAddress::root(&host).join("../outside.txt");
        let err = translator.to_real_path(&addr).unwrap_err();
        assert!(matches!(err, FsError::PermissionDenied(_)));

        // Climbing back up past segments already consumed also escapes
        let addr = VirtualAddress::root(&host).join("a/../../outside.txt");
        assert!(translator.to_real_path(&addr).is_err());
    }

    #[test]
    fn test_to_virtual_address() {
        let (translator, host, dir) = setup();
        let base = dunce::canonicalize(dir.path()).unwrap();

        let addr = translator
            .to_virtual_address(&base.join("sub/file.txt"))
            .unwrap();
        assert_eq!(addr.host(), host);
        assert_eq!(addr.segments(), ["sub", "file.txt"]);

        let err = translator
            .to_virtual_address(Path::new("/definitely/not/mounted"))
            .unwrap_err();
        assert!(matches!(err, FsError::PathNotMounted(_)));
    }

    #[test]
    fn test_round_trip_for_nonexistent_paths() {
        let (translator, host, dir) = setup();
        let base = dunce::canonicalize(dir.path()).unwrap();

        // real -> virtual -> real
        let real = base.join("not/yet/created.txt");
        let addr = translator.to_virtual_address(&real).unwrap();
        assert_eq!(translator.to_real_path(&addr).unwrap(), real);

        // virtual -> real -> virtual
        let addr = VirtualAddress::root(&host).join("deep/x.rs");
        let real = translator.to_real_path(&addr).unwrap();
        assert_eq!(translator.to_virtual_address(&real).unwrap(), addr);
    }

    #[test]
    fn test_nested_mount_resolves_to_inner_host() {
        let registry = Arc::new(HostRegistry::open(Arc::new(MemoryStore::new())).unwrap());
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("inner");
        std::fs::create_dir(&nested).unwrap();

        registry.mount(dir.path()).unwrap();
        let inner = registry.mount(&nested).unwrap();

        let translator = PathTranslator::new(registry);
        let addr = translator
            .to_virtual_address(&dunce::canonicalize(&nested).unwrap().join("f.txt"))
            .unwrap();
        assert_eq!(addr.host(), inner);
        assert_eq!(addr.segments(), ["f.txt"]);
    }
}
