//! File resource converger
//!
//! Makes one path match one [`FileSpec`], changing only what differs.
//!
//! ```text
//! resolve content → read current state → diff → (no diff: done)
//!                                              → stage + rename, or chown/chmod in place
//! ```

use crate::resolver::ContentResolver;
use crate::staging::{Attributes, StagedFile};
use crate::state::{CurrentState, DesiredState};
use converge_core::{Action, Change, ConvergeError, ConvergeResult, FileSpec, FsOp, DEFAULT_FILE_MODE};
use std::fs;
use std::io;

/// Converges file resources against the live filesystem
///
/// Holds no state between calls. Callers must not converge the same path
/// from two threads at once.
#[derive(Debug, Clone)]
pub struct FileResourceConverger<R> {
    resolver: R,
    dry_run: bool,
}

impl<R: ContentResolver> FileResourceConverger<R> {
    /// Converger that fetches content through `resolver`
    #[inline]
    #[must_use]
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            dry_run: false,
        }
    }

    /// Report what would change without writing anything
    #[inline]
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Whether writes are suppressed
    #[inline]
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Content resolver in use
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Bring `spec`'s path into the declared state
    ///
    /// # Returns
    /// `changed: true` when anything differed (and, unless dry-running, was fixed)
    ///
    /// # Errors
    /// - `ConvergeError::Resolution` if the content source cannot be resolved
    /// - `ConvergeError::Permission` if a filesystem operation is denied
    /// - `ConvergeError::Io` for other filesystem failures
    /// - `ConvergeError::UnknownOwner` / `UnknownGroup` for unknown identities
    pub fn converge(&self, spec: &FileSpec) -> Result<ConvergeResult, ConvergeError> {
        let result = match spec.action() {
            Action::Create => self.create(spec, false)?,
            Action::CreateIfMissing => self.create(spec, true)?,
            Action::Delete => self.delete(spec)?,
        };

        if result.changed {
            tracing::info!(
                resource = %spec,
                action = %spec.action(),
                changes = %result.summary(),
                dry_run = self.dry_run,
                "resource updated"
            );
        } else {
            tracing::debug!(resource = %spec, action = %spec.action(), "resource up to date");
        }
        Ok(result)
    }

    fn create(&self, spec: &FileSpec, only_if_missing: bool) -> Result<ConvergeResult, ConvergeError> {
        let path = spec.destination();
        if only_if_missing && CurrentState::read(path)?.is_some() {
            return Ok(ConvergeResult::unchanged());
        }

        let content = self
            .resolver
            .resolve(spec.source())
            .map_err(|e| ConvergeError::resolution(spec.source().clone(), e))?;
        let desired = DesiredState::resolve(spec, &content)?;
        let current = CurrentState::read(path)?;
        tracing::debug!(
            resource = %spec,
            exists = current.is_some(),
            checksum = %desired.digest.short(),
            "compared current state"
        );

        let changes = desired.diff(current.as_ref());
        let result = ConvergeResult::from_changes(changes).with_checksum(desired.digest);
        if !result.changed || self.dry_run {
            return Ok(result);
        }

        let rewrite = result
            .changes
            .iter()
            .any(|change| matches!(change, Change::Created | Change::Content));
        if rewrite {
            // unmanaged attributes of a replaced file carry over
            let attributes = Attributes {
                uid: desired.uid.or(current.map(|c| c.uid)),
                gid: desired.gid.or(current.map(|c| c.gid)),
                mode: desired.mode.or(current.map(|c| c.mode)).or(Some(DEFAULT_FILE_MODE)),
            };
            StagedFile::stage(path, &content, &attributes)?.commit()?;
        } else {
            // chown clears setuid/setgid, so a managed mode is reapplied after it
            let chowned = result
                .changes
                .iter()
                .any(|change| matches!(change, Change::Owner | Change::Group));
            let attributes = Attributes {
                uid: desired.uid.filter(|_| result.changes.contains(&Change::Owner)),
                gid: desired.gid.filter(|_| result.changes.contains(&Change::Group)),
                mode: desired
                    .mode
                    .filter(|_| chowned || result.changes.contains(&Change::Mode)),
            };
            attributes.apply(path)?;
        }
        Ok(result)
    }

    fn delete(&self, spec: &FileSpec) -> Result<ConvergeResult, ConvergeError> {
        let path = spec.destination();
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ConvergeResult::unchanged()),
            Err(e) => return Err(ConvergeError::io(path, FsOp::Stat, e)),
        };
        if metadata.is_dir() {
            return Err(ConvergeError::io(
                path,
                FsOp::Remove,
                io::Error::other("path is a directory, expected a file"),
            ));
        }

        if !self.dry_run {
            fs::remove_file(path).map_err(|e| ConvergeError::io(path, FsOp::Remove, e))?;
        }
        Ok(ConvergeResult::from_changes(vec![Change::Deleted]))
    }
}
