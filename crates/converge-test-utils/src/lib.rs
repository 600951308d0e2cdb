//! Testing utilities for the Converge workspace
//!
//! Shared fixtures: scratch directories, the sample index page, and the
//! identity of the user running the tests (so ownership can be asserted
//! without root).

#![allow(missing_docs)]

use converge_core::{FileSpec, Mode};
use converge_file::InMemoryAssets;
use nix::unistd::{Gid, Group, Uid, User};
use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const INDEX_HTML: &str = "<!doctype html>\n<html><body><h1>Sample App</h1></body></html>\n";

/// Name of the effective user
pub fn current_user() -> String {
    User::from_uid(Uid::effective())
        .ok()
        .flatten()
        .map_or_else(|| Uid::effective().to_string(), |user| user.name)
}

/// Name of the effective group
pub fn current_group() -> String {
    Group::from_gid(Gid::effective())
        .ok()
        .flatten()
        .map_or_else(|| Gid::effective().to_string(), |group| group.name)
}

/// Ownership changes to foreign ids need root
pub fn running_as_root() -> bool {
    Uid::effective().is_root()
}

/// Asset table holding `index.html`
pub fn sample_assets() -> InMemoryAssets {
    InMemoryAssets::new().with("index.html", INDEX_HTML)
}

/// The sample recipe's file resource, retargeted at `destination` and owned
/// by the current user
pub fn index_spec(destination: &Path) -> FileSpec {
    let user = current_user();
    FileSpec::new(destination, "index.html")
        .unwrap()
        .with_owner(user)
        .with_group(current_group())
        .with_mode(Mode::new(0o644).unwrap())
}

/// Scratch directory standing in for a web root
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Directory entries, sorted
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.root())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Permission bits of `path`
pub fn mode_of(path: &Path) -> u32 {
    fs::metadata(path).unwrap().permissions().mode() & 0o7777
}

/// Numeric (uid, gid) of `path`
pub fn ids_of(path: &Path) -> (u32, u32) {
    let metadata = fs::metadata(path).unwrap();
    (metadata.uid(), metadata.gid())
}

pub fn set_mode(path: &Path, mode: u32) {
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}
