//! JSON output formatter for machine processing
//!
//! One document per run. Analysis lists each project's range, tier
//! counts, dependencies and outliers; apply lists the attempted queue with
//! each operation's outcome. Green and unknown dependencies appear only in
//! verbose mode, though the tier counts always cover every dependency.

use crate::domain::{
    AnalysisReport, DependencyUpdateInfo, FailedOperation, HealthTier, MutationOperation,
    OutlierRecord,
};
use crate::orchestrator::{AnalysisRun, ApplyOutcome, ApplyRun, ProjectFailure};
use crate::output::{OutputFormatter, Verbosity};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Creates a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

#[derive(Serialize)]
struct JsonAnalysisOutput<'a> {
    projects: Vec<JsonReport<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<JsonFailure<'a>>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    /// `engines.node` declared by the project
    #[serde(skip_serializing_if = "Option::is_none")]
    engines: Option<&'a str>,
    /// Resolved range expression, null when empty
    range: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<String>,
    constraint_count: usize,
    contradictory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_runtime: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    upgrade_options: Vec<String>,
    tiers: JsonTierCounts,
    dependencies: Vec<&'a DependencyUpdateInfo>,
    outliers: &'a [OutlierRecord],
}

#[derive(Serialize)]
struct JsonTierCounts {
    red: usize,
    orange: usize,
    yellow: usize,
    green: usize,
    unknown: usize,
}

#[derive(Serialize)]
struct JsonFailure<'a> {
    path: String,
    message: &'a str,
}

#[derive(Serialize)]
struct JsonApplyOutput<'a> {
    projects: Vec<JsonApplyProject<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<JsonFailure<'a>>,
    summary: JsonApplySummary,
}

#[derive(Serialize)]
struct JsonApplyProject<'a> {
    path: String,
    operations: Vec<JsonOperation<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    engines: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    errors: &'a [String],
}

/// An attempted or skipped operation
#[derive(Serialize)]
struct JsonOperation<'a> {
    #[serde(flatten)]
    operation: &'a MutationOperation,
    /// succeeded, failed or not_attempted
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct JsonApplySummary {
    projects: usize,
    updates: usize,
    replacements: usize,
    engines_updated: usize,
    errors: usize,
}

impl JsonFormatter {
    fn report_to_json<'a>(&self, report: &'a AnalysisReport) -> JsonReport<'a> {
        let dependencies = report
            .dependencies
            .iter()
            .filter(|d| {
                self.verbosity == Verbosity::Verbose
                    || !matches!(d.health, HealthTier::Green | HealthTier::Unknown)
            })
            .collect();

        JsonReport {
            path: report.project_path.display().to_string(),
            name: report.project_name.as_deref(),
            engines: report.root_constraint.as_deref(),
            range: report.range.expression(),
            min: report.range.min.as_ref().map(|v| v.to_string()),
            max: report.range.max.as_ref().map(|v| v.to_string()),
            constraint_count: report.constraint_count,
            contradictory: report.is_contradictory(),
            current_runtime: report.current_runtime.as_ref().map(|v| v.to_string()),
            upgrade_options: report.upgrade_options.iter().map(|v| v.to_string()).collect(),
            tiers: JsonTierCounts {
                red: report.count_tier(HealthTier::Red),
                orange: report.count_tier(HealthTier::Orange),
                yellow: report.count_tier(HealthTier::Yellow),
                green: report.count_tier(HealthTier::Green),
                unknown: report.count_tier(HealthTier::Unknown),
            },
            dependencies,
            outliers: &report.outliers,
        }
    }

    fn outcome_to_json<'a>(outcome: &'a ApplyOutcome) -> JsonApplyProject<'a> {
        let operations = outcome
            .queue
            .iter()
            .map(|op| {
                if outcome.result.succeeded.contains(op) {
                    JsonOperation {
                        operation: op,
                        status: "succeeded",
                        error_kind: None,
                        error: None,
                    }
                } else if let Some(failed) = find_failure(&outcome.result.failed, op) {
                    JsonOperation {
                        operation: op,
                        status: "failed",
                        error_kind: Some(failed.error.kind()),
                        error: Some(failed.error.to_string()),
                    }
                } else {
                    JsonOperation {
                        operation: op,
                        status: "not_attempted",
                        error_kind: None,
                        error: None,
                    }
                }
            })
            .collect();

        JsonApplyProject {
            path: outcome.summary.project_path.display().to_string(),
            operations,
            engines: outcome.engines.as_deref(),
            errors: &outcome.summary.errors,
        }
    }
}

fn find_failure<'a>(
    failed: &'a [FailedOperation],
    operation: &MutationOperation,
) -> Option<&'a FailedOperation> {
    failed.iter().find(|f| &f.operation == operation)
}

fn failures_to_json(failures: &[ProjectFailure]) -> Vec<JsonFailure<'_>> {
    failures
        .iter()
        .map(|f| JsonFailure {
            path: f.project_path.display().to_string(),
            message: &f.message,
        })
        .collect()
}

fn write_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    writeln!(writer, "{}", json)
}

impl OutputFormatter for JsonFormatter {
    fn format_analysis(&self, run: &AnalysisRun, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = JsonAnalysisOutput {
            projects: run.reports.iter().map(|r| self.report_to_json(r)).collect(),
            errors: failures_to_json(&run.failures),
        };
        write_json(&output, writer)
    }

    fn format_apply(&self, run: &ApplyRun, writer: &mut dyn Write) -> std::io::Result<()> {
        let summaries = run.summaries();
        let output = JsonApplyOutput {
            projects: run.outcomes.iter().map(Self::outcome_to_json).collect(),
            errors: failures_to_json(&run.failures),
            summary: JsonApplySummary {
                projects: run.outcomes.len() + run.failures.len(),
                updates: summaries.iter().map(|s| s.updates).sum(),
                replacements: summaries.iter().map(|s| s.replacements).sum(),
                engines_updated: summaries.iter().filter(|s| s.engines_updated).count(),
                errors: summaries.iter().map(|s| s.errors.len()).sum::<usize>()
                    + run.failures.len(),
            },
        };
        write_json(&output, writer)
    }
}
