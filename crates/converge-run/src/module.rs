//! Module steps
//!
//! A module is an opaque, reusable unit of host configuration (for example
//! installing a web server). It either runs to completion or fails the run;
//! nothing flows from it into the file resources that follow.

use crate::config::ModuleConfig;
use crate::error::{ConfigError, ModuleError};
use std::collections::BTreeMap;
use std::fmt;
use std::process::Command;

/// External configuration module
pub trait Module: Send + Sync {
    /// Name recipes include it by
    fn name(&self) -> &str;

    /// Run to completion
    ///
    /// # Errors
    /// Any failure; the runner stops before the next step
    fn run(&self) -> Result<(), ModuleError>;
}

/// Module backed by an external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandModule {
    name: String,
    program: String,
    args: Vec<String>,
}

impl CommandModule {
    /// Module running `program` with `args`
    #[must_use]
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
        }
    }

    /// Build from a recipe declaration
    ///
    /// # Errors
    /// `ConfigError::InvalidModule` if the command is empty
    pub fn from_config(config: &ModuleConfig) -> Result<Self, ConfigError> {
        let (program, args) = config.command.split_first().ok_or_else(|| ConfigError::InvalidModule {
            name: config.name.clone(),
            reason: "command is empty".into(),
        })?;
        Ok(Self::new(&config.name, program, args.to_vec()))
    }
}

impl Module for CommandModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> Result<(), ModuleError> {
        tracing::debug!(module = %self.name, program = %self.program, args = ?self.args, "running module command");
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|source| ModuleError::Spawn {
                name: self.name.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(ModuleError::Failed {
            name: self.name.clone(),
            status: output.status,
            stderr,
        })
    }
}

/// Modules available to recipes, by name
#[derive(Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Box<dyn Module>>,
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModuleRegistry {
    /// Create empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of command modules declared in a recipe
    ///
    /// # Errors
    /// Invalid module declarations
    pub fn from_config(modules: &[ModuleConfig]) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for config in modules {
            registry.register(CommandModule::from_config(config)?);
        }
        Ok(registry)
    }

    /// Register a module, replacing any with the same name
    pub fn register(&mut self, module: impl Module + 'static) {
        self.modules.insert(module.name().to_string(), Box::new(module));
    }

    /// Look up a module
    ///
    /// # Errors
    /// `ModuleError::NotRegistered` if unknown
    pub fn get(&self, name: &str) -> Result<&dyn Module, ModuleError> {
        self.modules
            .get(name)
            .map(|module| module.as_ref())
            .ok_or_else(|| ModuleError::NotRegistered(name.to_string()))
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
