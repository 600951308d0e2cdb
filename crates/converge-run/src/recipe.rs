//! Materialized recipe

use converge_core::FileSpec;
use std::path::PathBuf;

/// A validated recipe, ready to run
///
/// Built from a [`crate::RecipeConfig`] for each run and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub name: String,
    /// Root directory file resources resolve their content from
    pub assets: PathBuf,
    /// Module names, run in order before any file resource
    pub modules: Vec<String>,
    /// File resources, converged in order
    pub files: Vec<FileSpec>,
}

impl Recipe {
    /// Empty recipe
    #[must_use]
    pub fn new(name: impl Into<String>, assets: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            assets: assets.into(),
            modules: Vec::new(),
            files: Vec::new(),
        }
    }

    /// With a module step
    #[must_use]
    pub fn include_module(mut self, name: impl Into<String>) -> Self {
        self.modules.push(name.into());
        self
    }

    /// With a file resource
    #[must_use]
    pub fn file(mut self, spec: FileSpec) -> Self {
        self.files.push(spec);
        self
    }

    /// Total number of steps
    #[inline]
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.modules.len() + self.files.len()
    }
}
