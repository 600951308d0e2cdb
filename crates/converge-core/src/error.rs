//! Error types for resource convergence
//!
//! Three failure families are surfaced to callers unmodified:
//! - content resolution (the named source could not produce bytes)
//! - permission (the process lacks rights for a filesystem operation)
//! - generic I/O (everything else the filesystem can throw)

use crate::spec::ContentSource;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;

/// Filesystem operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    Stat,
    Read,
    Write,
    Chown,
    Chmod,
    Rename,
    Remove,
}

impl Display for FsOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stat => "stat",
            Self::Read => "read",
            Self::Write => "write",
            Self::Chown => "chown",
            Self::Chmod => "chmod",
            Self::Rename => "rename",
            Self::Remove => "remove",
        })
    }
}

/// Errors raised while resolving a content source into bytes
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No asset with this name
    #[error("content source not found: '{0}'")]
    NotFound(String),

    /// Name is malformed or points outside the asset store
    #[error("invalid content source '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Asset exists but could not be read
    #[error("io error reading content source '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    /// Create invalid-name error
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from converging one resource
#[derive(Debug, thiserror::Error)]
pub enum ConvergeError {
    /// Content source could not be resolved
    #[error("cannot resolve content source '{source_id}': {source}")]
    Resolution {
        source_id: ContentSource,
        #[source]
        source: ResolveError,
    },

    /// Insufficient rights for a filesystem operation
    #[error("permission denied: {op} {path}: {source}")]
    Permission {
        path: PathBuf,
        op: FsOp,
        #[source]
        source: io::Error,
    },

    /// Any other filesystem failure
    #[error("io error: {op} {path}: {source}")]
    Io {
        path: PathBuf,
        op: FsOp,
        #[source]
        source: io::Error,
    },

    /// Owner name does not exist on this host
    #[error("unknown owner: '{0}'")]
    UnknownOwner(String),

    /// Group name does not exist on this host
    #[error("unknown group: '{0}'")]
    UnknownGroup(String),

    /// Desired-state record is malformed
    #[error("invalid file spec: {0}")]
    InvalidSpec(String),
}

impl ConvergeError {
    /// Classify a filesystem error for `path`
    ///
    /// `PermissionDenied` becomes [`ConvergeError::Permission`]; every other
    /// kind becomes [`ConvergeError::Io`].
    pub fn io(path: impl Into<PathBuf>, op: FsOp, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::Permission { path, op, source }
        } else {
            Self::Io { path, op, source }
        }
    }

    /// Create resolution error
    pub fn resolution(source_id: ContentSource, source: ResolveError) -> Self {
        Self::Resolution { source_id, source }
    }

    /// Whether this is a permission failure
    #[inline]
    #[must_use]
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Permission { .. })
    }

    /// Whether this is a content resolution failure
    #[inline]
    #[must_use]
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. })
    }
}
