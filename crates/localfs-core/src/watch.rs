//! Change event bridge.
//!
//! Wraps one native recursive watcher, normalizes its notifications into
//! [`ChangeEvent`]s addressed virtually, and fans them out to registered
//! callbacks. Two silent-drop policies apply on delivery: paths matching
//! the ignore list, and paths no mount covers. Both are noise suppression,
//! not errors.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use notify::{PollWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::address::VirtualAddress;
use crate::error::{FsError, FsResult};
use crate::translate::PathTranslator;
use crate::types::{ChangeEvent, ChangeKind};

/// Path segments excluded from watch delivery: version-control metadata
/// and dependency caches. Matched as whole components, not substrings.
pub const IGNORED_SEGMENTS: &[&str] = &[".git", "node_modules"];

/// Returns true if any whole path component matches the ignore list.
pub fn is_ignored_path(path: &Path) -> bool {
    path.components().any(|c| {
        matches!(c, Component::Normal(s) if IGNORED_SEGMENTS.contains(&s.to_string_lossy().as_ref()))
    })
}

/// A normalized native notification, still addressed by real path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChange {
    /// Kind of change.
    pub kind: ChangeKind,
    /// Real path the native layer reported.
    pub path: PathBuf,
}

/// The native watcher interface the bridge drives.
///
/// Keeping this small makes the polling-vs-kernel-notification tradeoff
/// swappable without touching bridge logic.
pub trait NativeWatcher: Send {
    /// Begin watching a real path recursively.
    fn add_target(&mut self, path: &Path) -> FsResult<()>;

    /// Stop watching a real path.
    fn remove_target(&mut self, path: &Path) -> FsResult<()>;
}

/// Production watcher: `notify`'s poll-based backend.
///
/// Polling trades latency for portability and robustness against missed
/// events on network-mounted or unusual filesystems.
pub struct PollingWatcher {
    inner: PollWatcher,
}

impl PollingWatcher {
    /// Create a polling watcher feeding raw changes into `tx`.
    pub fn spawn(tx: mpsc::Sender<RawChange>, poll_interval: Duration) -> FsResult<Self> {
        let inner = PollWatcher::new(
            move |result: Result<notify::Event, notify::Error>| {
                let Ok(event) = result else { return };
                let kind = match event.kind {
                    notify::EventKind::Create(_) => Some(ChangeKind::Created),
                    notify::EventKind::Modify(_) => Some(ChangeKind::Changed),
                    notify::EventKind::Remove(_) => Some(ChangeKind::Deleted),
                    _ => None,
                };
                if let Some(kind) = kind {
                    for path in event.paths {
                        // Channel full: drop, notification is best-effort.
                        let _ = tx.try_send(RawChange { kind, path });
                    }
                }
            },
            notify::Config::default().with_poll_interval(poll_interval),
        )
        .map_err(|e| FsError::unknown(format!("create watcher: {e}")))?;
        Ok(Self { inner })
    }
}

impl NativeWatcher for PollingWatcher {
    fn add_target(&mut self, path: &Path) -> FsResult<()> {
        self.inner
            .watch(path, RecursiveMode::Recursive)
            .map_err(|e| FsError::unknown(format!("watch {}: {e}", path.display())))
    }

    fn remove_target(&mut self, path: &Path) -> FsResult<()> {
        self.inner
            .unwatch(path)
            .map_err(|e| FsError::unknown(format!("unwatch {}: {e}", path.display())))
    }
}

type ChangeCallback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Fans normalized change events out to subscribers.
pub struct ChangeBridge {
    translator: Arc<PathTranslator>,
    watcher: Mutex<Box<dyn NativeWatcher>>,
    callbacks: DashMap<u64, ChangeCallback>,
    /// Watch refcounts per exact real path. The native watcher sees each
    /// path once; the last release removes it.
    targets: DashMap<PathBuf, usize>,
    next_callback_id: AtomicU64,
}

impl ChangeBridge {
    /// Create a bridge over the given translator and native watcher.
    pub fn new(translator: Arc<PathTranslator>, watcher: Box<dyn NativeWatcher>) -> Arc<Self> {
        Arc::new(Self {
            translator,
            watcher: Mutex::new(watcher),
            callbacks: DashMap::new(),
            targets: DashMap::new(),
            next_callback_id: AtomicU64::new(0),
        })
    }

    /// Spawn the delivery pump consuming raw changes from `rx`.
    ///
    /// The pump exits when every sender is dropped.
    pub fn start(self: &Arc<Self>, mut rx: mpsc::Receiver<RawChange>) -> tokio::task::JoinHandle<()> {
        let bridge = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(raw) = rx.recv().await {
                bridge.deliver(raw);
            }
            tracing::debug!("change bridge pump stopped");
        })
    }

    /// Watch the real path behind a virtual address.
    ///
    /// Ignored paths are accepted but never registered: no events will
    /// fire for them, and no error is raised. Releasing the returned guard
    /// unregisters exactly this path.
    pub fn watch(self: &Arc<Self>, address: &VirtualAddress) -> FsResult<WatchGuard> {
        let real = self.translator.to_real_path(address)?;
        if is_ignored_path(&real) {
            tracing::debug!(path = %real.display(), "watch target ignored");
            return Ok(WatchGuard {
                bridge: Arc::clone(self),
                path: None,
            });
        }

        {
            let mut count = self.targets.entry(real.clone()).or_insert(0);
            if *count == 0 {
                self.watcher.lock().add_target(&real)?;
                tracing::debug!(path = %real.display(), "watch target added");
            }
            *count += 1;
        }

        Ok(WatchGuard {
            bridge: Arc::clone(self),
            path: Some(real),
        })
    }

    /// Register a change callback. Releasing the guard removes it; removal
    /// is idempotent and safe while a delivery pass is in flight.
    pub fn on_change(
        self: &Arc<Self>,
        callback: impl Fn(&ChangeEvent) + Send + Sync + 'static,
    ) -> CallbackGuard {
        let id = self.next_callback_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks.insert(id, Arc::new(callback));
        CallbackGuard {
            bridge: Arc::clone(self),
            id: Some(id),
        }
    }

    /// Deliver one raw notification to all current subscribers.
    ///
    /// Events are processed in arrival order; no coalescing happens here.
    pub fn deliver(&self, raw: RawChange) {
        if is_ignored_path(&raw.path) {
            tracing::debug!(path = %raw.path.display(), "change on ignored path dropped");
            return;
        }
        let address = match self.translator.to_virtual_address(&raw.path) {
            Ok(address) => address,
            Err(_) => {
                // Silent-drop policy: stray events never reach subscribers
                // as errors.
                tracing::debug!(path = %raw.path.display(), "change outside any mount dropped");
                return;
            }
        };

        let event = ChangeEvent {
            kind: raw.kind,
            address,
        };
        tracing::debug!(kind = ?event.kind, address = %event.address, "change delivered");

        // Stable snapshot: concurrent register/unregister cannot
        // invalidate this pass.
        let snapshot: Vec<ChangeCallback> =
            self.callbacks.iter().map(|e| Arc::clone(e.value())).collect();
        for callback in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
                tracing::error!(address = %event.address, "change callback panicked");
            }
        }
    }

    fn unwatch(&self, path: &Path) {
        let last = match self.targets.get_mut(path) {
            Some(mut count) => {
                *count -= 1;
                *count == 0
            }
            None => false,
        };
        if last && self.targets.remove_if(path, |_, count| *count == 0).is_some() {
            if let Err(e) = self.watcher.lock().remove_target(path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove watch target");
            } else {
                tracing::debug!(path = %path.display(), "watch target removed");
            }
        }
    }

    fn remove_callback(&self, id: u64) {
        self.callbacks.remove(&id);
    }
}

/// Guard for one watch registration. Release (or drop) stops delivery for
/// exactly the registered path, leaving overlapping registrations intact.
pub struct WatchGuard {
    bridge: Arc<ChangeBridge>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchGuard")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl WatchGuard {
    /// Unregister the watched path. Equivalent to dropping the guard.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(path) = self.path.take() {
            self.bridge.unwatch(&path);
        }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// Guard for one registered change callback.
pub struct CallbackGuard {
    bridge: Arc<ChangeBridge>,
    id: Option<u64>,
}

impl CallbackGuard {
    /// Unregister the callback. Equivalent to dropping the guard.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(id) = self.id.take() {
            self.bridge.remove_callback(id);
        }
    }
}

impl Drop for CallbackGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}
