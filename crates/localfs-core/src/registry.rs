//! Host registry: stable host identifiers for mounted directories.
//!
//! The registry owns the set of `(host, base_dir)` mappings. Mounting the
//! same directory twice returns the existing host; reverse lookup uses
//! longest-prefix matching so nested mounts resolve to the most specific
//! mapping. The mapping set is persisted synchronously on every mutation,
//! so a mount survives a crash immediately after `mount` returns.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{FsError, FsResult};
use crate::store::StateStore;

/// State key under which the mapping set is persisted.
pub const HOST_STATE_KEY: &str = "localfs.hosts";

/// One `host -> base directory` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMapping {
    /// Host identifier, unique within the registry.
    pub host: String,
    /// Absolute, normalized base directory.
    pub base_dir: PathBuf,
}

struct RegistryState {
    mappings: Vec<HostMapping>,
    next_host: u64,
}

/// Registry of mounted directories.
///
/// An explicit owned object: callers share it via `Arc`, never through
/// global state, so independent registries can coexist in tests.
pub struct HostRegistry {
    state: RwLock<RegistryState>,
    store: Arc<dyn StateStore>,
}

impl HostRegistry {
    /// Open a registry backed by the given store, restoring any persisted
    /// mapping set. Absence of prior state yields an empty registry.
    pub fn open(store: Arc<dyn StateStore>) -> FsResult<Self> {
        let mappings: Vec<HostMapping> = match store.load(HOST_STATE_KEY)? {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| FsError::registry(format!("corrupt host state: {e}")))?,
            None => Vec::new(),
        };

        // Re-seed the counter above every persisted id so a fresh host can
        // never collide with a live mapping.
        let next_host = mappings
            .iter()
            .filter_map(|m| m.host.strip_prefix("host"))
            .filter_map(|n| n.parse::<u64>().ok())
            .map(|n| n + 1)
            .max()
            .unwrap_or(0);

        tracing::debug!(count = mappings.len(), "host registry loaded");

        Ok(Self {
            state: RwLock::new(RegistryState {
                mappings,
                next_host,
            }),
            store,
        })
    }

    /// Mount a directory, returning its host identifier.
    ///
    /// Idempotent: if the exact directory is already mounted, the existing
    /// host is returned and no new mapping is created. Fails with
    /// [`FsError::Registry`] if the path is not absolute. The updated
    /// mapping set is persisted before this returns.
    pub fn mount(&self, base_dir: &Path) -> FsResult<String> {
        if !base_dir.is_absolute() {
            return Err(FsError::registry(format!(
                "mount path must be absolute: {}",
                base_dir.display()
            )));
        }
        // Canonicalize when the directory exists; otherwise fold `.`/`..`
        // lexically so the stored base is still normalized.
        let base_dir =
            dunce::canonicalize(base_dir).unwrap_or_else(|_| normalize_lexically(base_dir));

        let mut state = self.state.write();
        if let Some(existing) = state.mappings.iter().find(|m| m.base_dir == base_dir) {
            tracing::debug!(host = %existing.host, dir = %base_dir.display(), "remount of existing directory");
            return Ok(existing.host.clone());
        }

        let host = format!("host{}", state.next_host);
        state.next_host += 1;
        state.mappings.push(HostMapping {
            host: host.clone(),
            base_dir: base_dir.clone(),
        });

        if let Err(e) = self.persist(&state.mappings) {
            state.mappings.pop();
            return Err(e);
        }

        tracing::info!(host = %host, dir = %base_dir.display(), "directory mounted");
        Ok(host)
    }

    /// Look up the base directory for a host.
    pub fn resolve_by_host(&self, host: &str) -> Option<PathBuf> {
        let state = self.state.read();
        state
            .mappings
            .iter()
            .find(|m| m.host == host)
            .map(|m| m.base_dir.clone())
    }

    /// Find the mapping whose base directory is the longest prefix of
    /// `path`, matched on whole path components.
    pub fn resolve_by_path(&self, path: &Path) -> Option<HostMapping> {
        let state = self.state.read();
        state
            .mappings
            .iter()
            .filter(|m| path.starts_with(&m.base_dir))
            .max_by_key(|m| m.base_dir.as_os_str().len())
            .cloned()
    }

    /// Snapshot of all current mappings.
    pub fn mappings(&self) -> Vec<HostMapping> {
        self.state.read().mappings.clone()
    }

    fn persist(&self, mappings: &[HostMapping]) -> FsResult<()> {
        let json = serde_json::to_string(mappings)
            .map_err(|e| FsError::registry(format!("serialize host state: {e}")))?;
        self.store.save(HOST_STATE_KEY, &json)
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

impl std::fmt::Debug for HostRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostRegistry")
            .field("mappings", &self.state.read().mappings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    fn registry() -> HostRegistry {
        HostRegistry::open(Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn test_mount_requires_absolute_path() {
        let reg = registry();
        let err = reg.mount(Path::new("relative/dir")).unwrap_err();
        assert!(matches!(err, FsError::Registry(_)));
    }

    #[test]
    fn test_mount_is_idempotent() {
        let reg = registry();
        let dir = TempDir::new().unwrap();

        let a = reg.mount(dir.path()).unwrap();
        let b = reg.mount(dir.path()).unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.mappings().len(), 1);
    }

    #[test]
    fn test_distinct_directories_get_distinct_hosts() {
        let reg = registry();
        let d1 = TempDir::new().unwrap();
        let d2 = TempDir::new().unwrap();

        let a = reg.mount(d1.path()).unwrap();
        let b = reg.mount(d2.path()).unwrap();
        assert_ne!(a, b);
        assert_eq!(reg.mappings().len(), 2);
    }

    #[test]
    fn test_mount_of_missing_directory_stores_normalized_base() {
        let reg = registry();
        let dir = TempDir::new().unwrap();
        let base = dunce::canonicalize(dir.path()).unwrap();

        // Does not exist yet, so canonicalize fails and the lexical
        // fallback must fold the dot segments.
        let messy = base.join("a").join("..").join("b").join(".");
        let host = reg.mount(&messy).unwrap();

        assert_eq!(reg.resolve_by_host(&host).unwrap(), base.join("b"));
        let mapping = reg.resolve_by_path(&base.join("b").join("f.txt")).unwrap();
        assert_eq!(mapping.host, host);
    }

    #[test]
    fn test_resolve_by_host() {
        let reg = registry();
        let dir = TempDir::new().unwrap();
        let host = reg.mount(dir.path()).unwrap();

        let base = reg.resolve_by_host(&host).unwrap();
        assert_eq!(base, dunce::canonicalize(dir.path()).unwrap());
        assert!(reg.resolve_by_host("nosuch").is_none());
    }

    #[test]
    fn test_resolve_by_path_longest_prefix() {
        let reg = registry();
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("b");
        std::fs::create_dir(&nested).unwrap();

        let outer = reg.mount(dir.path()).unwrap();
        let inner = reg.mount(&nested).unwrap();

        let mapping = reg.resolve_by_path(&nested.join("c")).unwrap();
        assert_eq!(mapping.host, inner);

        let mapping = reg.resolve_by_path(&dir.path().join("other")).unwrap();
        assert_eq!(mapping.host, outer);
    }

    #[test]
    fn test_resolve_by_path_matches_components_not_substrings() {
        let reg = registry();
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("proj");
        std::fs::create_dir(&base).unwrap();
        reg.mount(&base).unwrap();

        // "/tmp/.../proj-extra" shares a string prefix but not a component
        let sibling = dir.path().join("proj-extra").join("f.txt");
        assert!(reg.resolve_by_path(&sibling).is_none());
    }

    #[test]
    fn test_unmounted_path_resolves_to_none() {
        let reg = registry();
        assert!(reg.resolve_by_path(Path::new("/nowhere/at/all")).is_none());
    }

    #[test]
    fn test_mappings_persist_across_reopen() {
        let store = Arc::new(MemoryStore::new());
        let dir = TempDir::new().unwrap();

        let host = {
            let reg = HostRegistry::open(Arc::clone(&store) as Arc<dyn StateStore>).unwrap();
            reg.mount(dir.path()).unwrap()
        };

        let reg = HostRegistry::open(store).unwrap();
        assert_eq!(
            reg.resolve_by_host(&host).unwrap(),
            dunce::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn test_counter_reseeded_above_persisted_ids() {
        let store = Arc::new(MemoryStore::new());
        let d1 = TempDir::new().unwrap();
        let d2 = TempDir::new().unwrap();

        let first = {
            let reg = HostRegistry::open(Arc::clone(&store) as Arc<dyn StateStore>).unwrap();
            reg.mount(d1.path()).unwrap()
        };

        let reg = HostRegistry::open(store).unwrap();
        let second = reg.mount(d2.path()).unwrap();
        assert_ne!(first, second);
    }
}
