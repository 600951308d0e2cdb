//! Converge Run - recipe runner
//!
//! Loads a recipe, runs its module steps, converges its file resources and
//! reports what happened.
//!
//! # Example
//!
//! ```rust,ignore
//! use converge_run::{ModuleRegistry, RecipeConfig, Runner};
//! use converge_file::{AssetDirectory, FileResourceConverger};
//!
//! let config = RecipeConfig::load("recipes/sample-app/recipe.toml")?;
//! let modules = ModuleRegistry::from_config(&config.modules)?;
//! let recipe = config.into_recipe(std::path::Path::new("recipes/sample-app"))?;
//!
//! let converger = FileResourceConverger::new(AssetDirectory::new(&recipe.assets));
//! let report = Runner::new(converger, modules).run(&recipe);
//! println!("{}", report.generate_text());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod module;
pub mod recipe;
pub mod report;
pub mod runner;

pub use config::{Attributes, FileConfig, ModuleConfig, RecipeConfig};
pub use error::{ConfigError, ModuleError};
pub use module::{CommandModule, Module, ModuleRegistry};
pub use recipe::Recipe;
pub use report::{RunId, RunReport, StepKind, StepOutcome, StepReport};
pub use runner::{FailurePolicy, Runner};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running recipes
    pub use crate::{
        FailurePolicy, Module, ModuleRegistry, Recipe, RecipeConfig, RunReport, Runner, StepOutcome,
    };
    pub use converge_core::{Action, FileSpec, Mode};
    pub use converge_file::{AssetDirectory, ContentResolver, FileResourceConverger, InMemoryAssets};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
