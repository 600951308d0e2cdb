//! Recipe runner
//!
//! Executes a [`Recipe`] strictly in sequence: every module step first, then
//! every file resource. A failed module ends the run before any file is
//! touched. A failed file resource ends the run under
//! [`FailurePolicy::FailFast`], or is recorded and passed over under
//! [`FailurePolicy::Continue`].

use crate::module::ModuleRegistry;
use crate::recipe::Recipe;
use crate::report::{RunReport, StepKind, StepOutcome, StepReport};
use converge_file::{ContentResolver, FileResourceConverger};

/// What to do after a file resource fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run; remaining steps are reported as skipped
    #[default]
    FailFast,
    /// Record the failure and carry on with the next file resource
    Continue,
}

/// Runs recipes against this host
#[derive(Debug)]
pub struct Runner<R> {
    converger: FileResourceConverger<R>,
    modules: ModuleRegistry,
    policy: FailurePolicy,
}

impl<R: ContentResolver> Runner<R> {
    /// Runner using `converger` for file resources and `modules` for module steps
    #[must_use]
    pub fn new(converger: FileResourceConverger<R>, modules: ModuleRegistry) -> Self {
        Self {
            converger,
            modules,
            policy: FailurePolicy::default(),
        }
    }

    /// With failure policy
    #[must_use]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[inline]
    #[must_use]
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run every step of `recipe`
    ///
    /// Never returns early with an error: failures are recorded against the
    /// step that caused them; check [`RunReport::succeeded`].
    pub fn run(&self, recipe: &Recipe) -> RunReport {
        let dry_run = self.converger.is_dry_run();
        let mut report = RunReport::begin(&recipe.name, dry_run);
        tracing::info!(
            recipe = %recipe.name,
            run_id = %report.run_id,
            steps = recipe.step_count(),
            dry_run,
            "starting run"
        );

        let mut halted = false;
        for name in &recipe.modules {
            let resource = format!("module[{name}]");
            if halted {
                report.push(skipped(resource, StepKind::Module));
                continue;
            }
            let outcome = self.run_module(name, dry_run);
            halted = matches!(outcome, StepOutcome::Failed { .. });
            report.push(StepReport::new(resource, StepKind::Module, outcome));
        }

        for spec in &recipe.files {
            if halted {
                report.push(skipped(spec.to_string(), StepKind::File));
                continue;
            }
            let mut step = StepReport::new(spec.to_string(), StepKind::File, StepOutcome::Unchanged);
            match self.converger.converge(spec) {
                Ok(result) => {
                    if result.changed {
                        step.outcome = StepOutcome::Changed;
                    }
                    step.changes = result.changes;
                    step.checksum = result.checksum;
                }
                Err(e) => {
                    tracing::error!(resource = %spec, error = %e, "file resource failed");
                    step.outcome = StepOutcome::Failed { error: e.to_string() };
                    halted = self.policy == FailurePolicy::FailFast;
                }
            }
            report.push(step);
        }

        report.finish();
        if report.succeeded() {
            tracing::info!(
                recipe = %recipe.name,
                changed = report.changed_count(),
                unchanged = report.unchanged_count(),
                "run complete"
            );
        } else {
            tracing::warn!(recipe = %recipe.name, failed = report.failed_count(), "run failed");
        }
        report
    }

    fn run_module(&self, name: &str, dry_run: bool) -> StepOutcome {
        let module = match self.modules.get(name) {
            Ok(module) => module,
            Err(e) => {
                tracing::error!(module = name, error = %e, "module step failed");
                return StepOutcome::Failed { error: e.to_string() };
            }
        };
        if dry_run {
            return StepOutcome::Skipped {
                reason: "dry run".into(),
            };
        }

        tracing::info!(module = name, "running module");
        match module.run() {
            Ok(()) => StepOutcome::Completed,
            Err(e) => {
                tracing::error!(module = name, error = %e, "module step failed");
                StepOutcome::Failed { error: e.to_string() }
            }
        }
    }
}

fn skipped(resource: String, kind: StepKind) -> StepReport {
    StepReport::new(
        resource,
        kind,
        StepOutcome::Skipped {
            reason: "earlier step failed".into(),
        },
    )
}
