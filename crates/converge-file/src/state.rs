//! Current and desired file state

use crate::ownership::{resolve_group, resolve_owner};
use converge_core::{Change, ContentHash, ConvergeError, FileSpec, FsOp, Mode};
use nix::unistd::{Gid, Uid};
use std::fs::{self, File};
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// What is on disk right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentState {
    /// Digest of the bytes on disk
    pub digest: ContentHash,
    /// Owning user
    pub uid: Uid,
    /// Owning group
    pub gid: Gid,
    /// Permission bits, file type stripped
    pub mode: Mode,
}

impl CurrentState {
    /// Read the state of `path`; `None` if nothing exists there
    ///
    /// Symlinks are followed, so a link is judged by its target. A dangling
    /// link reads as absent.
    ///
    /// # Errors
    /// Fails on stat/read errors and when `path` is a directory or another
    /// non-regular file
    pub fn read(path: &Path) -> Result<Option<Self>, ConvergeError> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConvergeError::io(path, FsOp::Stat, e)),
        };
        if !metadata.is_file() {
            return Err(ConvergeError::io(
                path,
                FsOp::Stat,
                io::Error::other(if metadata.is_dir() {
                    "path is a directory, expected a regular file"
                } else {
                    "path is not a regular file"
                }),
            ));
        }

        let file = File::open(path).map_err(|e| ConvergeError::io(path, FsOp::Read, e))?;
        let digest =
            ContentHash::compute_reader(file).map_err(|e| ConvergeError::io(path, FsOp::Read, e))?;

        Ok(Some(Self {
            digest,
            uid: Uid::from_raw(metadata.uid()),
            gid: Gid::from_raw(metadata.gid()),
            mode: Mode::from_st_mode(metadata.mode()),
        }))
    }
}

/// Desired attributes with identities resolved to numeric ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesiredState {
    /// Digest of the resolved content
    pub digest: ContentHash,
    /// Managed owner, if any
    pub uid: Option<Uid>,
    /// Managed group, if any
    pub gid: Option<Gid>,
    /// Managed permission bits, if any
    pub mode: Option<Mode>,
}

impl DesiredState {
    /// Resolve `spec`'s identities and hash the desired `content`
    ///
    /// # Errors
    /// Fails when the owner or group does not exist on this host
    pub fn resolve(spec: &FileSpec, content: &[u8]) -> Result<Self, ConvergeError> {
        Ok(Self {
            digest: ContentHash::compute(content),
            uid: spec.owner().map(resolve_owner).transpose()?,
            gid: spec.group().map(resolve_group).transpose()?,
            mode: spec.mode(),
        })
    }

    /// Differences against `current`, in application order
    ///
    /// An absent file yields a single [`Change::Created`], which implies
    /// content and every managed attribute.
    #[must_use]
    pub fn diff(&self, current: Option<&CurrentState>) -> Vec<Change> {
        let Some(current) = current else {
            return vec![Change::Created];
        };

        let mut changes = Vec::new();
        if current.digest != self.digest {
            changes.push(Change::Content);
        }
        if self.uid.is_some_and(|uid| uid != current.uid) {
            changes.push(Change::Owner);
        }
        if self.gid.is_some_and(|gid| gid != current.gid) {
            changes.push(Change::Group);
        }
        if self.mode.is_some_and(|mode| mode != current.mode) {
            changes.push(Change::Mode);
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current(content: &[u8], mode: u32) -> CurrentState {
        CurrentState {
            digest: ContentHash::compute(content),
            uid: Uid::from_raw(1000),
            gid: Gid::from_raw(1000),
            mode: Mode::new(mode).unwrap(),
        }
    }

    fn desired(content: &[u8], mode: Option<u32>) -> DesiredState {
        DesiredState {
            digest: ContentHash::compute(content),
            uid: Some(Uid::from_raw(1000)),
            gid: Some(Gid::from_raw(1000)),
            mode: mode.map(|m| Mode::new(m).unwrap()),
        }
    }

    #[test]
    fn missing_file_is_created() {
        assert_eq!(desired(b"x", Some(0o644)).diff(None), vec![Change::Created]);
    }

    #[test]
    fn identical_state_has_no_changes() {
        let state = current(b"x", 0o644);
        assert!(desired(b"x", Some(0o644)).diff(Some(&state)).is_empty());
    }

    #[test]
    fn each_attribute_detected() {
        let mut state = current(b"old", 0o600);
        state.uid = Uid::from_raw(0);
        state.gid = Gid::from_raw(0);
        assert_eq!(
            desired(b"new", Some(0o644)).diff(Some(&state)),
            vec![Change::Content, Change::Owner, Change::Group, Change::Mode]
        );
    }

    #[test]
    fn unmanaged_attributes_ignored() {
        let state = current(b"x", 0o600);
        let mut want = desired(b"x", None);
        want.uid = None;
        want.gid = None;
        assert!(want.diff(Some(&state)).is_empty());
    }

    #[test]
    fn reads_regular_file_state() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.txt");
        fs::write(&path, b"contents").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let state = CurrentState::read(&path).unwrap().unwrap();
        assert_eq!(state.digest, ContentHash::compute(b"contents"));
        assert_eq!(state.mode.bits(), 0o640);
        assert_eq!(state.uid, Uid::effective());
    }

    #[test]
    fn absent_and_directory_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CurrentState::read(&dir.path().join("missing")).unwrap().is_none());
        let err = CurrentState::read(dir.path()).unwrap_err();
        assert!(matches!(err, ConvergeError::Io { op: FsOp::Stat, .. }));
    }
}
