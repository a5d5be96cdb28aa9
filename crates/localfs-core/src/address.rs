//! Virtual addresses.
//!
//! A virtual address names a path under a mounted host:
//! `localfs://host0/src/main.rs`. Callers interact only with addresses;
//! translation to and from real paths lives in [`crate::translate`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{FsError, FsResult};

/// Scheme for two-part virtual addresses (`localfs://host/relative/path`).
pub const SCHEME: &str = "localfs";

/// Reserved scheme carrying a real, host-filesystem path. Accepted by the
/// deep-link handler that converts such an address into a mount request.
pub const ABS_SCHEME: &str = "localfsabs";

/// A `(host, relative-path)` pair used by callers instead of a real path.
///
/// Addresses are never stored by the core; they are constructed by callers
/// or derived on demand from real paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VirtualAddress {
    host: String,
    segments: Vec<String>,
}

impl VirtualAddress {
    /// The root address of a host.
    pub fn root(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            segments: Vec::new(),
        }
    }

    /// Build an address from a host and relative path segments.
    pub fn from_parts(host: impl Into<String>, segments: Vec<String>) -> Self {
        Self {
            host: host.into(),
            segments,
        }
    }

    /// Parse a `localfs://host/relative/path` string.
    ///
    /// Empty segments (doubled or trailing slashes) are dropped. Any other
    /// scheme is rejected.
    pub fn parse(s: &str) -> FsResult<Self> {
        let prefix = format!("{SCHEME}://");
        let rest = s
            .strip_prefix(&prefix)
            .ok_or_else(|| FsError::registry(format!("unknown scheme: {s}")))?;
        let (host, path) = match rest.split_once('/') {
            Some((host, path)) => (host, path),
            None => (rest, ""),
        };
        if host.is_empty() {
            return Err(FsError::registry(format!("missing host: {s}")));
        }
        Ok(Self {
            host: host.to_string(),
            segments: split_segments(path),
        })
    }

    /// The host identifier.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The relative path segments, in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true if this is the root address of its host.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a relative path (may contain slashes) to this address.
    pub fn join(&self, path: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(split_segments(path));
        Self {
            host: self.host.clone(),
            segments,
        }
    }

    /// The relative path portion as a `PathBuf`.
    pub fn relative_path(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}://{}/{}", self.host, self.segments.join("/"))
    }
}

fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
