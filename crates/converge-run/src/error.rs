//! Error types for recipe runs
//!
//! Provides error handling for:
//! - Recipe loading (file → RecipeConfig)
//! - Materialization (RecipeConfig → Recipe)
//! - Module steps (external install modules)

use converge_core::ConvergeError;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors loading or materializing a recipe
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Recipe file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Recipe is not valid TOML for the expected schema
    #[error("parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Owner/group placeholder names an attribute with no value
    #[error("attribute '{0}' is referenced but not set")]
    MissingAttribute(String),

    /// Owner/group placeholder names an attribute that does not exist
    #[error("unknown attribute reference '@{0}'")]
    UnknownAttribute(String),

    /// Two file resources share a destination
    #[error("duplicate file resource: {0}")]
    DuplicateResource(PathBuf),

    /// Same module declared twice
    #[error("duplicate module: {0}")]
    DuplicateModule(String),

    /// A module declaration is unusable
    #[error("invalid module '{name}': {reason}")]
    InvalidModule { name: String, reason: String },

    /// A file resource declaration is invalid
    #[error("invalid file resource: {0}")]
    InvalidResource(#[from] ConvergeError),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from module steps
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// Recipe includes a module nobody registered
    #[error("module not registered: {0}")]
    NotRegistered(String),

    /// Module command could not be started
    #[error("module '{name}' could not start: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Module ran and reported failure
    #[error("module '{name}' failed with {status}: {stderr}")]
    Failed {
        name: String,
        status: ExitStatus,
        stderr: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::DuplicateResource(PathBuf::from("/var/www/html/index.html"));
        assert_eq!(err.to_string(), "duplicate file resource: /var/www/html/index.html");
        let err = ConfigError::UnknownAttribute("port".into());
        assert_eq!(err.to_string(), "unknown attribute reference '@port'");
    }

    #[test]
    fn converge_error_converts() {
        let err: ConfigError = ConvergeError::InvalidSpec("relative".into()).into();
        assert!(matches!(err, ConfigError::InvalidResource(_)));
    }

    #[test]
    fn module_error_display() {
        let err = ModuleError::NotRegistered("apache2".into());
        assert_eq!(err.to_string(), "module not registered: apache2");
    }
}
