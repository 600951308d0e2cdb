//! Runner Tests
//!
//! Whole recipe runs against a scratch directory: module ordering, failure
//! policies, dry runs and re-runs.

use converge_core::{Action, Change, FileSpec};
use converge_file::FileResourceConverger;
use converge_run::{
    CommandModule, FailurePolicy, ModuleRegistry, Recipe, RecipeConfig, Runner, StepKind, StepOutcome,
};
use converge_test_utils::{current_user, index_spec, mode_of, sample_assets, Sandbox, INDEX_HTML};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

fn modules(entries: &[(&str, &[&str])]) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    for (name, command) in entries {
        let (program, args) = command.split_first().unwrap();
        registry.register(CommandModule::new(
            *name,
            *program,
            args.iter().map(ToString::to_string).collect(),
        ));
    }
    registry
}

fn sample_recipe(sandbox: &Sandbox) -> Recipe {
    Recipe::new("sample-app", sandbox.root())
        .include_module("apache2")
        .file(index_spec(&sandbox.path("index.html")))
}

#[test]
fn test_sample_recipe_converges_then_is_stable() {
    let sandbox = Sandbox::new();
    let recipe = sample_recipe(&sandbox);
    let runner = Runner::new(
        FileResourceConverger::new(sample_assets()),
        modules(&[("apache2", &["true"])]),
    );

    let first = runner.run(&recipe);
    assert!(first.succeeded());
    assert_eq!(first.steps.len(), 2);
    assert_eq!(first.steps[0].kind, StepKind::Module);
    assert_eq!(first.steps[0].outcome, StepOutcome::Completed);
    assert_eq!(first.steps[1].outcome, StepOutcome::Changed);
    assert_eq!(first.steps[1].changes, vec![Change::Created]);
    assert_eq!(fs::read_to_string(sandbox.path("index.html")).unwrap(), INDEX_HTML);

    let second = runner.run(&recipe);
    assert!(second.succeeded());
    assert_eq!(second.steps[1].outcome, StepOutcome::Unchanged);
    assert_eq!(second.changed_count(), 0);
    assert_ne!(first.run_id, second.run_id);
}

#[test]
fn test_failed_module_stops_before_files() {
    let sandbox = Sandbox::new();
    let recipe = sample_recipe(&sandbox);
    let runner = Runner::new(
        FileResourceConverger::new(sample_assets()),
        modules(&[("apache2", &["sh", "-c", "exit 1"])]),
    );

    let report = runner.run(&recipe);

    assert!(!report.succeeded());
    assert!(matches!(report.steps[0].outcome, StepOutcome::Failed { .. }));
    assert!(matches!(report.steps[1].outcome, StepOutcome::Skipped { .. }));
    assert!(!sandbox.path("index.html").exists());
}

#[test]
fn test_unregistered_module_fails_run() {
    let sandbox = Sandbox::new();
    let runner = Runner::new(FileResourceConverger::new(sample_assets()), ModuleRegistry::new());

    let report = runner.run(&sample_recipe(&sandbox));

    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.skipped_count(), 1);
}

#[test]
fn test_fail_fast_skips_remaining_files() {
    let sandbox = Sandbox::new();
    let recipe = Recipe::new("broken", sandbox.root())
        .file(FileSpec::new(sandbox.path("missing.html"), "missing.html").unwrap())
        .file(index_spec(&sandbox.path("index.html")));
    let runner = Runner::new(FileResourceConverger::new(sample_assets()), ModuleRegistry::new());

    let report = runner.run(&recipe);

    assert_eq!(runner.policy(), FailurePolicy::FailFast);
    assert!(matches!(report.steps[0].outcome, StepOutcome::Failed { .. }));
    assert!(matches!(report.steps[1].outcome, StepOutcome::Skipped { .. }));
    assert!(!sandbox.path("index.html").exists());
}

#[test]
fn test_continue_policy_converges_the_rest() {
    let sandbox = Sandbox::new();
    let recipe = Recipe::new("broken", sandbox.root())
        .file(FileSpec::new(sandbox.path("missing.html"), "missing.html").unwrap())
        .file(index_spec(&sandbox.path("index.html")));
    let runner = Runner::new(FileResourceConverger::new(sample_assets()), ModuleRegistry::new())
        .with_policy(FailurePolicy::Continue);

    let report = runner.run(&recipe);

    assert!(!report.succeeded());
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.changed_count(), 1);
    assert_eq!(sandbox.entries(), vec!["index.html"]);
}

#[test]
fn test_dry_run_touches_nothing() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.path("stale.conf"), "old").unwrap();
    let recipe = sample_recipe(&sandbox).file(
        FileSpec::new(sandbox.path("stale.conf"), "stale.conf")
            .unwrap()
            .with_action(Action::Delete),
    );
    // a dry run must not execute modules either
    let runner = Runner::new(
        FileResourceConverger::new(sample_assets()).dry_run(true),
        modules(&[("apache2", &["sh", "-c", "exit 1"])]),
    );

    let report = runner.run(&recipe);

    assert!(report.dry_run);
    assert!(report.succeeded());
    assert!(matches!(report.steps[0].outcome, StepOutcome::Skipped { .. }));
    assert_eq!(report.steps[1].changes, vec![Change::Created]);
    assert_eq!(report.steps[2].changes, vec![Change::Deleted]);
    assert_eq!(sandbox.entries(), vec!["stale.conf"]);
}

#[test]
fn test_recipe_file_end_to_end() {
    let sandbox = Sandbox::new();
    let assets = sandbox.path("files");
    fs::create_dir(&assets).unwrap();
    fs::write(assets.join("index.html"), INDEX_HTML).unwrap();
    let destination = sandbox.path("index.html");
    let recipe_file = sandbox.path("recipe.toml");
    fs::write(
        &recipe_file,
        format!(
            r#"
name = "sample-app"

[attributes]
user = "{user}"

[[modules]]
name = "apache2"
command = ["true"]

[[files]]
path = "{path}"
owner = "@user"
mode = "0640"
"#,
            user = current_user(),
            path = destination.display(),
        ),
    )
    .unwrap();

    let config = RecipeConfig::load(&recipe_file).unwrap();
    let registry = ModuleRegistry::from_config(&config.modules).unwrap();
    let recipe = config.into_recipe(sandbox.root()).unwrap();
    assert_eq!(recipe.assets, assets);

    let converger = FileResourceConverger::new(converge_file::AssetDirectory::new(&recipe.assets));
    let report = Runner::new(converger, registry).run(&recipe);

    assert!(report.succeeded(), "{}", report.generate_text());
    assert_eq!(fs::read_to_string(&destination).unwrap(), INDEX_HTML);
    assert_eq!(mode_of(&destination), 0o640);
}

#[test]
fn test_bundled_sample_recipe_is_valid() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/sample-app/recipe.toml");
    let config = RecipeConfig::load(&path).unwrap();
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let recipe = config.into_recipe(base_dir).unwrap();

    assert_eq!(recipe.name, "sample-app");
    assert_eq!(recipe.modules, vec!["apache2".to_string()]);
    assert_eq!(recipe.files[0].destination(), Path::new("/var/www/html/index.html"));
    assert!(recipe.assets.join("index.html").is_file());
}
