use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use converge_file::{AssetDirectory, FileResourceConverger};
use converge_run::{ConfigError, FailurePolicy, ModuleRegistry, Recipe, RecipeConfig, Runner};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

fn cli() -> Command {
    let recipe = Arg::new("recipe")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .help("Path to the recipe TOML file");

    Command::new("converge")
        .version(converge_run::VERSION)
        .about("Converge this host to the state declared by a recipe")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("apply")
                .about("Run a recipe")
                .arg(recipe.clone())
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Report what would change without touching the host"),
                )
                .arg(
                    Arg::new("continue-on-error")
                        .long("continue-on-error")
                        .action(ArgAction::SetTrue)
                        .help("Keep converging file resources after one fails"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the run report as JSON"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Validate a recipe without running it")
                .arg(recipe),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load and materialize a recipe; relative asset paths anchor at the recipe's directory
fn load(path: &Path) -> Result<(Recipe, ModuleRegistry), ConfigError> {
    let config = RecipeConfig::load(path)?;
    let modules = ModuleRegistry::from_config(&config.modules)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let recipe = config.into_recipe(base_dir)?;
    Ok((recipe, modules))
}

fn recipe_path(args: &ArgMatches) -> anyhow::Result<&PathBuf> {
    args.get_one::<PathBuf>("recipe").context("missing recipe path")
}

fn apply(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let path = recipe_path(args)?;
    let (recipe, modules) = match load(path) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "invalid recipe");
            return Ok(ExitCode::from(EXIT_CONFIG));
        }
    };

    let policy = if args.get_flag("continue-on-error") {
        FailurePolicy::Continue
    } else {
        FailurePolicy::FailFast
    };
    let converger = FileResourceConverger::new(AssetDirectory::new(&recipe.assets)).dry_run(args.get_flag("dry-run"));
    let report = Runner::new(converger, modules).with_policy(policy).run(&recipe);

    if args.get_flag("json") {
        let json = serde_json::to_string_pretty(&report).context("serializing run report")?;
        println!("{json}");
    } else {
        print!("{}", report.generate_text());
    }

    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILED)
    })
}

fn check(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let path = recipe_path(args)?;
    match load(path) {
        Ok((recipe, modules)) => {
            println!(
                "Recipe {} is valid: {} module(s) registered, {} step(s)",
                recipe.name,
                modules.len(),
                recipe.step_count()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            Ok(ExitCode::from(EXIT_CONFIG))
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("apply", args)) => apply(args),
        Some(("check", args)) => check(args),
        _ => Ok(ExitCode::from(EXIT_CONFIG)),
    }
}
