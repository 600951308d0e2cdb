//! Recipe configuration
//!
//! A recipe is declared in TOML:
//!
//! ```toml
//! name = "sample-app"
//! assets = "files"
//!
//! [attributes]
//! user = "appuser"
//!
//! [[modules]]
//! name = "apache2"
//! command = ["apt-get", "install", "-y", "apache2"]
//!
//! [[files]]
//! path = "/var/www/html/index.html"
//! source = "index.html"
//! owner = "@user"
//! group = "@user"
//! mode = "644"
//! action = "create"
//! ```
//!
//! Values are plain fields. The only indirection is the `@user` placeholder
//! in `owner`/`group`, replaced by `attributes.user` when the config is
//! turned into a [`Recipe`].

use crate::error::ConfigError;
use crate::recipe::Recipe;
use converge_core::{Action, FileSpec, Mode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

fn default_assets() -> PathBuf {
    PathBuf::from("files")
}

/// Whole recipe file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeConfig {
    /// Recipe name, used in logs and reports
    pub name: String,
    /// Asset directory, relative to the recipe file
    #[serde(default = "default_assets")]
    pub assets: PathBuf,
    /// Values referenced from resource declarations
    #[serde(default)]
    pub attributes: Attributes,
    /// Modules to run, in order, before any file resource
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
    /// File resources, converged in order
    #[serde(default)]
    pub files: Vec<FileConfig>,
}

/// Typed recipe attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attributes {
    /// Application user owning deployed files
    pub user: Option<String>,
}

impl Attributes {
    /// With application user
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Replace an `@name` placeholder with its value; other strings pass through
    ///
    /// # Errors
    /// Unknown or unset attributes
    pub fn expand(&self, value: &str) -> Result<String, ConfigError> {
        let Some(name) = value.strip_prefix('@') else {
            return Ok(value.to_string());
        };
        match name {
            "user" => self
                .user
                .clone()
                .ok_or_else(|| ConfigError::MissingAttribute(name.to_string())),
            other => Err(ConfigError::UnknownAttribute(other.to_string())),
        }
    }
}

/// External module step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    pub name: String,
    /// Program and arguments; the module succeeds when it exits 0
    pub command: Vec<String>,
}

/// File resource declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub path: PathBuf,
    /// Asset name; defaults to the destination's file name
    pub source: Option<String>,
    pub owner: Option<String>,
    pub group: Option<String>,
    pub mode: Option<Mode>,
    #[serde(default)]
    pub action: Action,
}

impl FileConfig {
    /// Build the desired-state record, expanding attribute placeholders
    ///
    /// # Errors
    /// Invalid destination or unresolvable attribute references
    pub fn to_spec(&self, attributes: &Attributes) -> Result<FileSpec, ConfigError> {
        let source = match &self.source {
            Some(source) => source.clone(),
            None => self
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        let mut spec = FileSpec::new(&self.path, source.as_str())?.with_action(self.action);
        if let Some(owner) = &self.owner {
            spec = spec.with_owner(attributes.expand(owner)?);
        }
        if let Some(group) = &self.group {
            spec = spec.with_group(attributes.expand(group)?);
        }
        if let Some(mode) = self.mode {
            spec = spec.with_mode(mode);
        }
        Ok(spec)
    }
}

impl RecipeConfig {
    /// Parse recipe TOML
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed input; `origin` is only used for messages
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read and parse a recipe file
    ///
    /// # Errors
    /// IO or parse failure
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        let config = Self::from_toml_str(&content, path)?;
        tracing::debug!(
            recipe = %config.name,
            path = %path.display(),
            modules = config.modules.len(),
            files = config.files.len(),
            "loaded recipe"
        );
        Ok(config)
    }

    /// Validate and turn into a runnable [`Recipe`]
    ///
    /// `base_dir` anchors a relative `assets` directory (normally the
    /// directory holding the recipe file).
    ///
    /// # Errors
    /// Duplicate modules or destinations, empty module commands, invalid file
    /// resources, unresolved attribute references
    pub fn into_recipe(self, base_dir: &Path) -> Result<Recipe, ConfigError> {
        let mut seen_modules = HashSet::new();
        for module in &self.modules {
            if !seen_modules.insert(module.name.as_str()) {
                return Err(ConfigError::DuplicateModule(module.name.clone()));
            }
            if module.command.is_empty() {
                return Err(ConfigError::InvalidModule {
                    name: module.name.clone(),
                    reason: "command is empty".into(),
                });
            }
        }

        let mut seen_paths = HashSet::new();
        let mut files = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let spec = file.to_spec(&self.attributes)?;
            if !seen_paths.insert(spec.destination().to_path_buf()) {
                return Err(ConfigError::DuplicateResource(spec.destination().to_path_buf()));
            }
            files.push(spec);
        }

        let assets = if self.assets.is_absolute() {
            self.assets
        } else {
            base_dir.join(self.assets)
        };

        Ok(Recipe {
            name: self.name,
            assets,
            modules: self.modules.into_iter().map(|m| m.name).collect(),
            files,
        })
    }
}
