//! Converge Core
//!
//! Desired-state records and the shared vocabulary of resource convergence.
//!
//! # Core Concepts
//!
//! - [`FileSpec`]: Immutable desired state of one file
//! - [`Action`]: `create`, `create_if_missing` or `delete`
//! - [`Mode`]: Validated permission bits
//! - [`ContentHash`]: BLAKE3 digest for content comparison
//! - [`ConvergeResult`]: Whether anything changed, and what
//! - [`ConvergeError`]: Resolution, permission and I/O failures
//!
//! # Example
//!
//! ```rust
//! use converge_core::{Action, FileSpec, Mode};
//!
//! let spec = FileSpec::new("/var/www/html/index.html", "index.html")?
//!     .with_owner("appuser")
//!     .with_group("appuser")
//!     .with_mode("644".parse::<Mode>()?)
//!     .with_action(Action::Create);
//! assert_eq!(spec.mode().map(Mode::bits), Some(0o644));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod hash;
mod mode;
mod outcome;
mod spec;

pub use error::{ConvergeError, FsOp, ResolveError};
pub use hash::{ContentHash, HashError};
pub use mode::{Mode, ModeError, DEFAULT_FILE_MODE, MAX_MODE};
pub use outcome::{Change, ConvergeResult};
pub use spec::{Action, ContentSource, FileSpec};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
