//! # localfs-core
//!
//! Exposes real, local directory trees as a uniform virtual filesystem
//! addressed by stable logical identifiers instead of absolute paths, and
//! relays native change notifications as a normalized event stream.
//!
//! A host mounts a directory and gets back a virtual root address
//! (`localfs://host0/`); every subsequent operation goes through that
//! address space while the actual I/O still happens against the real
//! filesystem:
//!
//! - [`HostRegistry`] - stable `(host, base directory)` mappings, persisted
//!   through a [`StateStore`]
//! - [`PathTranslator`] - virtual address ↔ real path, longest-prefix
//!   reverse lookup
//! - [`LocalFs`] / [`FsProvider`] - the read/write/list/metadata surface
//! - [`ChangeBridge`] - normalizes native watcher notifications into
//!   [`ChangeEvent`]s and fans them out to subscribers
//! - [`LocalFsService`] - wires the above together for a host application
//!
//! This is a translation and notification layer, not a filesystem: change
//! notification is best-effort, and each operation is only as atomic as
//! the native call behind it.

pub mod address;
pub mod error;
pub mod fsops;
pub mod raw;
pub mod registry;
pub mod service;
pub mod store;
pub mod translate;
pub mod types;
pub mod watch;

pub use address::{ABS_SCHEME, SCHEME, VirtualAddress};
pub use error::{FsError, FsResult};
pub use fsops::{FsProvider, LocalFs};
pub use registry::{HOST_STATE_KEY, HostMapping, HostRegistry};
pub use service::LocalFsService;
pub use store::{MemoryStore, SqliteStore, StateStore};
pub use translate::PathTranslator;
pub use types::{ChangeEvent, ChangeKind, DirEntry, FileKind, FileStat, WriteOptions};
pub use watch::{
    CallbackGuard, ChangeBridge, IGNORED_SEGMENTS, NativeWatcher, PollingWatcher, RawChange,
    WatchGuard, is_ignored_path,
};
