//! Converge File
//!
//! The boundary between declared file resources and the host filesystem.
//!
//! # Core Operations
//!
//! - **Resolve**: turn a content source name into bytes ([`ContentResolver`])
//! - **Compare**: read on-disk state and diff it against the desired state
//! - **Apply**: stage, chown, chmod and rename into place, or fix attributes in place
//!
//! # Architecture
//!
//! ```text
//! FileSpec → ContentResolver → DesiredState ─┐
//!                                            ├─ diff → StagedFile → rename
//! Filesystem → CurrentState ─────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use converge_file::{AssetDirectory, FileResourceConverger};
//! use converge_core::{FileSpec, Mode};
//!
//! let converger = FileResourceConverger::new(AssetDirectory::new("recipe/files"));
//! let spec = FileSpec::new("/var/www/html/index.html", "index.html")?
//!     .with_owner("appuser")
//!     .with_group("appuser")
//!     .with_mode(Mode::new(0o644)?);
//!
//! let first = converger.converge(&spec)?;
//! let second = converger.converge(&spec)?;
//! assert!(first.changed && !second.changed);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod converger;
pub mod ownership;
pub mod resolver;
pub mod staging;
pub mod state;

pub use converger::FileResourceConverger;
pub use ownership::{resolve_group, resolve_owner};
pub use resolver::{AssetDirectory, ContentResolver, InMemoryAssets};
pub use staging::{Attributes, StagedFile};
pub use state::{CurrentState, DesiredState};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
