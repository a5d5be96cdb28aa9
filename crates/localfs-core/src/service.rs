//! Host-facing assembly.
//!
//! [`LocalFsService`] wires the registry, translator, provider, and change
//! bridge together behind the mount boundary: a host hands it a durable
//! state store, mounts real directories, and registers the provider and
//! bridge as a filesystem backend under the `localfs` scheme.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::address::{ABS_SCHEME, VirtualAddress};
use crate::error::{FsError, FsResult};
use crate::fsops::LocalFs;
use crate::registry::HostRegistry;
use crate::store::StateStore;
use crate::translate::PathTranslator;
use crate::watch::{ChangeBridge, PollingWatcher, RawChange};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const RAW_CHANNEL_CAPACITY: usize = 256;

/// The assembled localfs core.
pub struct LocalFsService {
    registry: Arc<HostRegistry>,
    translator: Arc<PathTranslator>,
    provider: Arc<LocalFs>,
    bridge: Arc<ChangeBridge>,
    // Exits on its own once the watcher (the only sender) is dropped.
    _pump: tokio::task::JoinHandle<()>,
}

impl LocalFsService {
    /// Assemble the service with the default watcher poll interval.
    ///
    /// Must be called from within a tokio runtime; the delivery pump is
    /// spawned here.
    pub fn new(store: Arc<dyn StateStore>) -> FsResult<Self> {
        Self::with_poll_interval(store, DEFAULT_POLL_INTERVAL)
    }

    /// Assemble the service with an explicit watcher poll interval.
    pub fn with_poll_interval(store: Arc<dyn StateStore>, poll_interval: Duration) -> FsResult<Self> {
        let registry = Arc::new(HostRegistry::open(store)?);
        let translator = Arc::new(PathTranslator::new(Arc::clone(&registry)));
        let provider = Arc::new(LocalFs::new(Arc::clone(&translator)));

        let (tx, rx): (mpsc::Sender<RawChange>, _) = mpsc::channel(RAW_CHANNEL_CAPACITY);
        let watcher = PollingWatcher::spawn(tx, poll_interval)?;
        let bridge = ChangeBridge::new(Arc::clone(&translator), Box::new(watcher));
        let pump = bridge.start(rx);

        Ok(Self {
            registry,
            translator,
            provider,
            bridge,
            _pump: pump,
        })
    }

    /// Mount a real directory, returning the virtual root address callers
    /// use from then on.
    pub fn mount(&self, path: &Path) -> FsResult<VirtualAddress> {
        let host = self.registry.mount(path)?;
        Ok(VirtualAddress::root(host))
    }

    /// Handle a `localfsabs://` address carrying a real path (e.g. from a
    /// deep link) by converting it into a mount request.
    pub fn handle_absolute_address(&self, address: &str) -> FsResult<VirtualAddress> {
        let prefix = format!("{ABS_SCHEME}://");
        let path = address
            .strip_prefix(&prefix)
            .ok_or_else(|| FsError::registry(format!("unknown scheme: {address}")))?;
        self.mount(Path::new(path))
    }

    /// The host registry.
    pub fn registry(&self) -> &Arc<HostRegistry> {
        &self.registry
    }

    /// The path translator.
    pub fn translator(&self) -> &Arc<PathTranslator> {
        &self.translator
    }

    /// The operation surface to register as a filesystem backend.
    pub fn provider(&self) -> &Arc<LocalFs> {
        &self.provider
    }

    /// The change event bridge (`watch`/`on_change`).
    pub fn bridge(&self) -> &Arc<ChangeBridge> {
        &self.bridge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    fn service() -> LocalFsService {
        LocalFsService::new(Arc::new(MemoryStore::new())).unwrap()
    }

    #[tokio::test]
    async fn test_mount_returns_root_address() {
        let svc = service();
        let dir = TempDir::new().unwrap();

        let root = svc.mount(dir.path()).unwrap();
        assert!(root.is_root());
        assert_eq!(
            svc.translator().to_real_path(&root).unwrap(),
            dunce::canonicalize(dir.path()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_remount_returns_same_host() {
        let svc = service();
        let dir = TempDir::new().unwrap();

        let a = svc.mount(dir.path()).unwrap();
        let b = svc.mount(dir.path()).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_absolute_address_handler_mounts() {
        let svc = service();
        let dir = TempDir::new().unwrap();

        let address = format!("localfsabs://{}", dir.path().display());
        let root = svc.handle_absolute_address(&address).unwrap();
        assert_eq!(root, svc.mount(dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_absolute_address_handler_rejects_other_schemes() {
        let svc = service();
        let err = svc.handle_absolute_address("file:///tmp/x").unwrap_err();
        assert!(matches!(err, FsError::Registry(_)));
    }
}
