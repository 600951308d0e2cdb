//! Content resolvers
//!
//! The converger never knows where bytes come from. It asks a
//! [`ContentResolver`] to turn a [`ContentSource`] name into bytes:
//! - [`AssetDirectory`]: files bundled next to a recipe (its `files/` dir)
//! - [`InMemoryAssets`]: a fixed name → bytes table

use converge_core::{ContentSource, ResolveError};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Turns a named content source into the bytes to write
pub trait ContentResolver {
    /// Resolve `source` into raw content
    ///
    /// # Errors
    /// Returns [`ResolveError`] when the source is unknown, malformed or unreadable
    fn resolve(&self, source: &ContentSource) -> Result<Vec<u8>, ResolveError>;
}

impl<R: ContentResolver + ?Sized> ContentResolver for &R {
    fn resolve(&self, source: &ContentSource) -> Result<Vec<u8>, ResolveError> {
        (**self).resolve(source)
    }
}

impl<R: ContentResolver + ?Sized> ContentResolver for Box<R> {
    fn resolve(&self, source: &ContentSource) -> Result<Vec<u8>, ResolveError> {
        (**self).resolve(source)
    }
}

impl<R: ContentResolver + ?Sized> ContentResolver for Arc<R> {
    fn resolve(&self, source: &ContentSource) -> Result<Vec<u8>, ResolveError> {
        (**self).resolve(source)
    }
}

/// Assets stored as plain files under a root directory
///
/// Names are relative paths below the root. Absolute names, `..` and other
/// non-normal components are rejected so a recipe cannot read outside its
/// asset directory.
#[derive(Debug, Clone)]
pub struct AssetDirectory {
    root: PathBuf,
}

impl AssetDirectory {
    /// Serve assets from `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Asset root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate a source name and join it onto the root
    ///
    /// # Errors
    /// Returns [`ResolveError::InvalidName`] for empty or escaping names
    pub fn locate(&self, source: &ContentSource) -> Result<PathBuf, ResolveError> {
        let name = source.as_str();
        if name.is_empty() {
            return Err(ResolveError::invalid_name(name, "empty name"));
        }
        let relative = Path::new(name);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => {
                    return Err(ResolveError::invalid_name(name, "must not contain '..'"));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(ResolveError::invalid_name(name, "must be relative to the asset root"));
                }
            }
        }
        Ok(self.root.join(relative))
    }
}

impl ContentResolver for AssetDirectory {
    fn resolve(&self, source: &ContentSource) -> Result<Vec<u8>, ResolveError> {
        let path = self.locate(source)?;
        tracing::debug!(source = %source, path = %path.display(), "resolving asset");
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResolveError::NotFound(source.to_string())
            } else {
                ResolveError::Io {
                    name: source.to_string(),
                    source: e,
                }
            }
        })
    }
}

/// Assets held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssets {
    assets: BTreeMap<String, Vec<u8>>,
}

impl InMemoryAssets {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With an asset
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(name, content);
        self
    }

    /// Add or replace an asset
    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.assets.insert(name.into(), content.into());
    }

    /// Number of assets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the table holds no assets
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl ContentResolver for InMemoryAssets {
    fn resolve(&self, source: &ContentSource) -> Result<Vec<u8>, ResolveError> {
        self.assets
            .get(source.as_str())
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(source.to_string()))
    }
}
