//! Desired-state records
//!
//! A [`FileSpec`] declares what one file on the host should look like. It is
//! built fresh for every run from static configuration and never mutated
//! afterwards; the live filesystem is always the authority for current state.

use crate::error::ConvergeError;
use crate::mode::Mode;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// Declared intent for a file resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// File must exist with the declared content and attributes
    #[default]
    Create,
    /// File is written only when absent; an existing file is left alone
    CreateIfMissing,
    /// File must not exist
    Delete,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::CreateIfMissing => "create_if_missing",
            Self::Delete => "delete",
        })
    }
}

/// Named reference to the bytes that should populate a file
///
/// Opaque to the converger; only a content resolver knows how to turn it into
/// bytes (for example a file name inside a bundled asset directory).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentSource(String);

impl ContentSource {
    /// Wrap a source identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContentSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentSource {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Desired state of one file
///
/// `owner`, `group` and `mode` are optional: an unset attribute is not
/// managed, so whatever the file currently has is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    destination: PathBuf,
    source: ContentSource,
    owner: Option<String>,
    group: Option<String>,
    mode: Option<Mode>,
    action: Action,
}

impl FileSpec {
    /// Start a `create` spec for `destination`
    ///
    /// # Errors
    /// Returns [`ConvergeError::InvalidSpec`] if the destination is empty or
    /// not absolute
    pub fn new(
        destination: impl Into<PathBuf>,
        source: impl Into<ContentSource>,
    ) -> Result<Self, ConvergeError> {
        let destination = destination.into();
        if destination.as_os_str().is_empty() {
            return Err(ConvergeError::InvalidSpec("destination path is empty".into()));
        }
        if !destination.is_absolute() {
            return Err(ConvergeError::InvalidSpec(format!(
                "destination path must be absolute: {}",
                destination.display()
            )));
        }
        if destination.file_name().is_none() {
            return Err(ConvergeError::InvalidSpec(format!(
                "destination path does not name a file: {}",
                destination.display()
            )));
        }
        Ok(Self {
            destination,
            source: source.into(),
            owner: None,
            group: None,
            mode: None,
            action: Action::Create,
        })
    }

    /// With owner (user name, or numeric uid)
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// With group (group name, or numeric gid)
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// With permission bits
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// With action
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Destination path; unique per run
    #[inline]
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> &ContentSource {
        &self.source
    }

    #[inline]
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    #[inline]
    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }
}

impl Display for FileSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "file[{}]", self.destination.display())
    }
}
