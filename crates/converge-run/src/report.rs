//! Run reports

use chrono::{DateTime, Utc};
use converge_core::{Change, ContentHash};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use ulid::Ulid;

/// Unique run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Module,
    File,
}

/// What happened to one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Module ran to completion; modules do not report what they changed
    Completed,
    /// Step ran and modified the host (or would have, in a dry run)
    Changed,
    /// Already converged
    Unchanged,
    /// Step failed
    Failed { error: String },
    /// Not attempted
    Skipped { reason: String },
}

/// Report line for one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// `module[name]` or `file[/path]`
    pub resource: String,
    pub kind: StepKind,
    #[serde(flatten)]
    pub outcome: StepOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<Change>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<ContentHash>,
}

impl StepReport {
    #[must_use]
    pub fn new(resource: impl Into<String>, kind: StepKind, outcome: StepOutcome) -> Self {
        Self {
            resource: resource.into(),
            kind,
            outcome,
            changes: Vec::new(),
            checksum: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, StepOutcome::Failed { .. })
    }
}

/// Outcome of a whole recipe run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub recipe: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
}

impl RunReport {
    /// Start a report for `recipe`
    #[must_use]
    pub fn begin(recipe: impl Into<String>, dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            run_id: RunId::new(),
            recipe: recipe.into(),
            dry_run,
            started_at: now,
            finished_at: now,
            steps: Vec::new(),
        }
    }

    /// Record a step
    pub fn push(&mut self, step: StepReport) {
        self.steps.push(step);
    }

    /// Stamp the finish time
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// No step failed
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !self.steps.iter().any(StepReport::is_failed)
    }

    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, StepOutcome::Changed))
    }

    #[must_use]
    pub fn unchanged_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, StepOutcome::Unchanged))
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, StepOutcome::Failed { .. }))
    }

    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, StepOutcome::Skipped { .. }))
    }

    fn count(&self, predicate: impl Fn(&StepOutcome) -> bool) -> usize {
        self.steps.iter().filter(|step| predicate(&step.outcome)).count()
    }

    /// Human-readable summary
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = String::new();
        let mode = if self.dry_run { " (dry run)" } else { "" };
        let _ = writeln!(out, "Recipe {} run {}{}", self.recipe, self.run_id, mode);
        for step in &self.steps {
            let status = match &step.outcome {
                StepOutcome::Changed if step.changes.is_empty() => "changed".to_string(),
                StepOutcome::Changed => format!(
                    "changed ({})",
                    step.changes.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
                ),
                StepOutcome::Completed => "completed".to_string(),
                StepOutcome::Unchanged => "up to date".to_string(),
                StepOutcome::Failed { error } => format!("FAILED: {error}"),
                StepOutcome::Skipped { reason } => format!("skipped: {reason}"),
            };
            let _ = writeln!(out, "  {:<40} {}", step.resource, status);
        }
        let elapsed = self.finished_at - self.started_at;
        let _ = writeln!(
            out,
            "{} changed, {} up to date, {} failed, {} skipped in {}ms",
            self.changed_count(),
            self.unchanged_count(),
            self.failed_count(),
            self.skipped_count(),
            elapsed.num_milliseconds()
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_report() -> RunReport {
        let mut report = RunReport::begin("sample-app", false);
        report.push(StepReport::new("module[apache2]", StepKind::Module, StepOutcome::Completed));
        let mut file = StepReport::new("file[/var/www/html/index.html]", StepKind::File, StepOutcome::Changed);
        file.changes = vec![Change::Mode];
        report.push(file);
        report.push(StepReport::new(
            "file[/etc/motd]",
            StepKind::File,
            StepOutcome::Failed {
                error: "permission denied".into(),
            },
        ));
        report.finish();
        report
    }

    #[test]
    fn counts_outcomes() {
        let report = sample_report();
        assert!(!report.succeeded());
        assert_eq!(report.changed_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.unchanged_count(), 0);
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn text_lists_every_step() {
        let text = sample_report().generate_text();
        assert!(text.starts_with("Recipe sample-app run "));
        assert!(text.contains("changed (mode)"));
        assert!(text.contains("FAILED: permission denied"));
        assert!(text.contains("module[apache2]"));
        assert!(text.contains("1 changed, 0 up to date, 1 failed, 0 skipped"));
    }

    #[test]
    fn json_shape() {
        let report = sample_report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["recipe"], "sample-app");
        assert_eq!(json["steps"][1]["status"], "changed");
        assert_eq!(json["steps"][1]["changes"], serde_json::json!(["mode"]));
        assert_eq!(json["steps"][2]["error"], "permission denied");

        let back: RunReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
