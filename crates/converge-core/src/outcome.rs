//! Convergence outcomes

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// One difference between current and desired state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    /// Path did not exist and was (or would be) written
    Created,
    /// Bytes on disk differ from the desired content
    Content,
    Owner,
    Group,
    Mode,
    /// Path existed and was (or would be) removed
    Deleted,
}

impl Display for Change {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Content => "content",
            Self::Owner => "owner",
            Self::Group => "group",
            Self::Mode => "mode",
            Self::Deleted => "deleted",
        })
    }
}

/// Result of converging one resource
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConvergeResult {
    /// Whether the resource was out of date
    pub changed: bool,
    /// Which differences were found, in application order
    pub changes: Vec<Change>,
    /// Digest of the desired content (create actions only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<ContentHash>,
}

impl ConvergeResult {
    /// Nothing to do
    #[inline]
    #[must_use]
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Build from a list of differences; empty means unchanged
    #[must_use]
    pub fn from_changes(changes: Vec<Change>) -> Self {
        Self {
            changed: !changes.is_empty(),
            changes,
            checksum: None,
        }
    }

    /// With content checksum
    #[must_use]
    pub fn with_checksum(mut self, checksum: ContentHash) -> Self {
        self.checksum = Some(checksum);
        self
    }

    /// Comma-separated change names, for logs
    #[must_use]
    pub fn summary(&self) -> String {
        self.changes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}
