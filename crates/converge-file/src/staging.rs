//! Atomic file replacement
//!
//! Content is written to a temporary file in the destination's directory,
//! given its final owner, group and mode, synced, then renamed over the
//! destination. Until [`StagedFile::commit`] the destination is untouched;
//! dropping a [`StagedFile`] removes the temporary file.

use converge_core::{ConvergeError, FsOp, Mode};
use nix::unistd::{Gid, Uid};
use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Attributes applied to a path, in this order: ownership, then mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attributes {
    /// New owner; `None` leaves it
    pub uid: Option<Uid>,
    /// New group; `None` leaves it
    pub gid: Option<Gid>,
    /// New permission bits; `None` leaves them
    pub mode: Option<Mode>,
}

impl Attributes {
    /// Chown (if any id is set) then chmod (if a mode is set) `path`
    ///
    /// # Errors
    /// Permission or I/O error from the failing syscall
    pub fn apply(&self, path: &Path) -> Result<(), ConvergeError> {
        if self.uid.is_some() || self.gid.is_some() {
            nix::unistd::chown(path, self.uid, self.gid)
                .map_err(|errno| ConvergeError::io(path, FsOp::Chown, io::Error::from(errno)))?;
        }
        if let Some(mode) = self.mode {
            fs::set_permissions(path, fs::Permissions::from_mode(mode.bits()))
                .map_err(|e| ConvergeError::io(path, FsOp::Chmod, e))?;
        }
        Ok(())
    }
}

/// Fully prepared replacement for `destination`
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    destination: PathBuf,
}

impl StagedFile {
    /// Write `content` next to `destination` and apply `attributes` to it
    ///
    /// # Errors
    /// Fails if the parent directory is missing or unwritable, or any write,
    /// sync, chown or chmod fails. The temporary file is removed on failure.
    pub fn stage(destination: &Path, content: &[u8], attributes: &Attributes) -> Result<Self, ConvergeError> {
        let parent = destination.parent().ok_or_else(|| {
            ConvergeError::InvalidSpec(format!("no parent directory: {}", destination.display()))
        })?;
        let file_name = destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{file_name}."))
            .suffix(".converge-tmp")
            .tempfile_in(parent)
            .map_err(|e| ConvergeError::io(parent, FsOp::Write, e))?;

        temp.write_all(content)
            .map_err(|e| ConvergeError::io(temp.path(), FsOp::Write, e))?;
        attributes.apply(temp.path())?;
        temp.as_file()
            .sync_all()
            .map_err(|e| ConvergeError::io(temp.path(), FsOp::Write, e))?;

        Ok(Self {
            temp,
            destination: destination.to_path_buf(),
        })
    }

    /// Temporary path holding the staged content
    #[inline]
    #[must_use]
    pub fn staged_path(&self) -> &Path {
        self.temp.path()
    }

    /// Rename the staged file over the destination
    ///
    /// # Errors
    /// Permission or I/O error from the rename; the temporary file is removed
    pub fn commit(self) -> Result<(), ConvergeError> {
        let destination = self.destination;
        self.temp
            .persist(&destination)
            .map_err(|e| ConvergeError::io(&destination, FsOp::Rename, e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn commit_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("index.html");
        fs::write(&destination, b"old").unwrap();

        let attributes = Attributes {
            mode: Some(Mode::new(0o640).unwrap()),
            ..Attributes::default()
        };
        let staged = StagedFile::stage(&destination, b"new", &attributes).unwrap();
        assert_eq!(fs::read(&destination).unwrap(), b"old");
        assert_eq!(staged.staged_path().parent(), Some(dir.path()));

        staged.commit().unwrap();
        assert_eq!(fs::read(&destination).unwrap(), b"new");
        assert_eq!(fs::metadata(&destination).unwrap().permissions().mode() & 0o7777, 0o640);
        assert_eq!(entries(dir.path()), vec!["index.html"]);
    }

    #[test]
    fn abandoned_stage_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("index.html");
        fs::write(&destination, b"original").unwrap();

        let staged = StagedFile::stage(&destination, b"replacement", &Attributes::default()).unwrap();
        let staged_path = staged.staged_path().to_path_buf();
        assert!(staged_path.exists());
        // a failure between staging and rename drops the staged file
        drop(staged);

        assert!(!staged_path.exists());
        assert_eq!(fs::read(&destination).unwrap(), b"original");
        assert_eq!(entries(dir.path()), vec!["index.html"]);
    }

    #[test]
    fn missing_parent_directory_fails_without_residue() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("missing").join("index.html");

        let err = StagedFile::stage(&destination, b"x", &Attributes::default()).unwrap_err();
        assert!(matches!(err, ConvergeError::Io { op: FsOp::Write, .. }));
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn rename_over_directory_fails_and_keeps_it() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("taken");
        fs::create_dir(&destination).unwrap();
        fs::write(destination.join("inner"), b"keep").unwrap();

        let staged = StagedFile::stage(&destination, b"x", &Attributes::default()).unwrap();
        assert!(staged.commit().is_err());
        assert_eq!(fs::read(destination.join("inner")).unwrap(), b"keep");
        assert_eq!(entries(dir.path()), vec!["taken"]);
    }
}
