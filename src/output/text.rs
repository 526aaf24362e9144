//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Per-project range, runtime and tier breakdown
//! - Dependency lines with health tier, best update and alternatives
//! - Range outliers with the range each one is hiding
//! - Apply outcomes per operation and an end-of-run summary

use crate::domain::{AnalysisReport, DependencyUpdateInfo, HealthTier, MutationOperation};
use crate::orchestrator::{AnalysisRun, ApplyOutcome, ApplyRun, ProjectFailure};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    color: bool,
}

impl TextFormatter {
    /// Creates a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Creates a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn tier_label(&self, tier: HealthTier) -> String {
        let label = tier.to_string();
        if !self.color {
            return label;
        }
        match tier {
            HealthTier::Red => label.red().bold().to_string(),
            HealthTier::Orange => label.truecolor(255, 140, 0).to_string(),
            HealthTier::Yellow => label.yellow().to_string(),
            HealthTier::Green => label.green().to_string(),
            HealthTier::Unknown => label.dimmed().to_string(),
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn dimmed(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn warning(&self, text: &str) -> String {
        if self.color {
            text.yellow().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn error(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    fn ok(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    /// Whether a dependency line is shown at the current verbosity
    fn shows_dependency(&self, dep: &DependencyUpdateInfo) -> bool {
        match self.verbosity {
            Verbosity::Quiet => false,
            Verbosity::Normal => !matches!(dep.health, HealthTier::Green | HealthTier::Unknown),
            Verbosity::Verbose => true,
        }
    }

    fn format_header(&self, report: &AnalysisReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let path = report.project_path.display().to_string();
        match &report.project_name {
            Some(name) => writeln!(writer, "{} {}", self.bold(name), self.dimmed(&format!("({})", path))),
            None => writeln!(writer, "{}", self.bold(&path)),
        }
    }

    fn format_range(&self, report: &AnalysisReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if report.constraint_count == 0 {
            return writeln!(
                writer,
                "  Node.js range  {}",
                self.dimmed("unconstrained (no engine constraints declared)")
            );
        }
        if report.is_contradictory() {
            writeln!(writer, "  Node.js range  {}", self.error("none"))?;
            return writeln!(
                writer,
                "  {}",
                self.warning(&format!(
                    "⚠ no Node.js version satisfies all {} engine constraints",
                    report.constraint_count
                ))
            );
        }
        let plural = if report.constraint_count == 1 { "" } else { "s" };
        writeln!(
            writer,
            "  Node.js range  {} {}",
            self.bold(&report.range.to_string()),
            self.dimmed(&format!(
                "(from {} engine constraint{})",
                report.constraint_count, plural
            ))
        )
    }

    fn format_runtime(&self, report: &AnalysisReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if let Some(engines) = &report.root_constraint {
            writeln!(writer, "  engines.node   {}", engines)?;
        }
        let Some(current) = &report.current_runtime else {
            return Ok(());
        };
        let inside = report.range.contains(current);
        let status = if report.constraint_count == 0 || inside {
            String::new()
        } else {
            format!(" {}", self.warning("(outside the range)"))
        };
        if report.upgrade_options.is_empty() {
            writeln!(writer, "  Runtime        {}{}", current, status)
        } else {
            let options: Vec<String> = report.upgrade_options.iter().map(|v| v.to_string()).collect();
            writeln!(
                writer,
                "  Runtime        {}{}, can move to {}",
                current,
                status,
                options.join(", ")
            )
        }
    }

    fn format_tiers(&self, report: &AnalysisReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let counts: Vec<String> = [
            HealthTier::Red,
            HealthTier::Orange,
            HealthTier::Yellow,
            HealthTier::Green,
            HealthTier::Unknown,
        ]
        .iter()
        .map(|tier| format!("{} {}", report.count_tier(*tier), self.tier_label(*tier)))
        .collect();
        writeln!(writer, "  Dependencies   {}", counts.join(", "))
    }

    fn format_dependency(
        &self,
        dep: &DependencyUpdateInfo,
        max_name_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let target = match dep.best_update() {
            Some(version) => format!(" → {}", self.bold(&version.to_string())),
            None => String::new(),
        };
        let latest = match &dep.latest_version {
            Some(latest) if dep.best_update() != Some(latest) => {
                self.dimmed(&format!(" (latest {})", latest))
            }
            _ => String::new(),
        };
        writeln!(
            writer,
            "    {:width$} {}{} [{}]{}",
            dep.name,
            dep.installed_version,
            target,
            self.tier_label(dep.health),
            latest,
            width = max_name_len
        )?;

        if self.verbosity == Verbosity::Verbose {
            if let Some(released) = dep.released_installed {
                writeln!(
                    writer,
                    "      {}",
                    self.dimmed(&format!("installed release {}", released.format("%Y/%m/%d")))
                )?;
            }
        }
        if let Some(note) = &dep.node_compatibility_note {
            writeln!(writer, "      {}", self.dimmed(note))?;
        }
        for alt in &dep.alternatives {
            writeln!(
                writer,
                "      ↳ consider {}@{}: {} {}",
                self.bold(&alt.name),
                alt.version,
                alt.reason,
                self.dimmed(&format!("[{}]", alt.source))
            )?;
        }
        Ok(())
    }

    fn format_report(&self, report: &AnalysisReport, writer: &mut dyn Write) -> std::io::Result<()> {
        self.format_header(report, writer)?;
        self.format_range(report, writer)?;
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }
        self.format_runtime(report, writer)?;
        self.format_tiers(report, writer)?;

        let shown: Vec<&DependencyUpdateInfo> = report
            .dependencies
            .iter()
            .filter(|d| self.shows_dependency(d))
            .collect();
        let max_name_len = shown.iter().map(|d| d.name.len()).max().unwrap_or(0).max(20);
        for dep in shown {
            self.format_dependency(dep, max_name_len, writer)?;
        }

        if !report.outliers.is_empty() {
            writeln!(writer, "  {}", self.bold("Range outliers"))?;
            for outlier in &report.outliers {
                writeln!(
                    writer,
                    "    {}@{} {} {}",
                    outlier.package_name,
                    outlier.package_version,
                    self.warning(&format!("node {}", outlier.constraint)),
                    outlier.impact
                )?;
                writeln!(
                    writer,
                    "      {}",
                    self.dimmed(&format!("without it: {}", outlier.range_without_dependency))
                )?;
            }
        }
        Ok(())
    }

    fn format_failures(&self, failures: &[ProjectFailure], writer: &mut dyn Write) -> std::io::Result<()> {
        for failure in failures {
            writeln!(
                writer,
                "{} {}: {}",
                self.error("✗"),
                failure.project_path.display(),
                failure.message
            )?;
        }
        Ok(())
    }

    fn format_outcome(&self, outcome: &ApplyOutcome, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer, "{}", self.bold(&outcome.summary.project_path.display().to_string()))?;

        if outcome.queue.is_empty() && outcome.engines.is_none() && outcome.summary.errors.is_empty() {
            return writeln!(writer, "  {}", self.dimmed("nothing to apply"));
        }

        for op in &outcome.queue {
            self.format_operation(op, outcome, writer)?;
        }

        if let Some(engines) = &outcome.engines {
            writeln!(writer, "  {} engines.node set to {}", self.ok("✓"), engines)?;
        }
        // operation failures were printed inline above
        for extra in outcome.summary.errors.iter().skip(outcome.result.failed.len()) {
            writeln!(writer, "  {} {}", self.error("✗"), extra)?;
        }
        if outcome.result.has_fatal_failure() {
            writeln!(
                writer,
                "  {}",
                self.error("restore failed: the project may be left partially modified")
            )?;
        }
        Ok(())
    }

    fn format_operation(
        &self,
        op: &MutationOperation,
        outcome: &ApplyOutcome,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if outcome.result.succeeded.contains(op) {
            return writeln!(writer, "  {} {}", self.ok("✓"), op);
        }
        match outcome.result.failed.iter().find(|f| &f.operation == op) {
            Some(failed) => {
                writeln!(
                    writer,
                    "  {} {} {}",
                    self.error("✗"),
                    op,
                    self.dimmed(&format!("[{}]", failed.error.kind()))
                )?;
                writeln!(writer, "      {}", failed.error)
            }
            None => writeln!(writer, "  {} {}", self.dimmed("-"), self.dimmed(&format!("{} (not attempted)", op))),
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format_analysis(&self, run: &AnalysisRun, writer: &mut dyn Write) -> std::io::Result<()> {
        for (i, report) in run.reports.iter().enumerate() {
            if i > 0 {
                writeln!(writer)?;
            }
            self.format_report(report, writer)?;
        }
        if !run.failures.is_empty() {
            writeln!(writer)?;
            self.format_failures(&run.failures, writer)?;
        }

        if run.reports.len() + run.failures.len() > 1 {
            let red: usize = run.reports.iter().map(|r| r.count_tier(HealthTier::Red)).sum();
            let outliers: usize = run.reports.iter().map(|r| r.outliers.len()).sum();
            writeln!(writer)?;
            writeln!(
                writer,
                "{} {} projects analyzed, {} red dependencies, {} range outliers, {} failed",
                self.bold("Summary:"),
                run.reports.len(),
                red,
                outliers,
                run.failures.len()
            )?;
        }
        Ok(())
    }

    fn format_apply(&self, run: &ApplyRun, writer: &mut dyn Write) -> std::io::Result<()> {
        for (i, outcome) in run.outcomes.iter().enumerate() {
            if i > 0 {
                writeln!(writer)?;
            }
            self.format_outcome(outcome, writer)?;
        }
        if !run.failures.is_empty() {
            writeln!(writer)?;
            self.format_failures(&run.failures, writer)?;
        }

        let summaries = run.summaries();
        let updates: usize = summaries.iter().map(|s| s.updates).sum();
        let replacements: usize = summaries.iter().map(|s| s.replacements).sum();
        let engines = summaries.iter().filter(|s| s.engines_updated).count();
        let errors: usize =
            summaries.iter().map(|s| s.errors.len()).sum::<usize>() + run.failures.len();

        writeln!(writer)?;
        let counts = format!(
            "{} updated, {} replaced, engines.node set in {} project{}",
            updates,
            replacements,
            engines,
            if engines == 1 { "" } else { "s" }
        );
        if errors == 0 {
            writeln!(writer, "{} {}", self.bold("Summary:"), counts)
        } else {
            writeln!(
                writer,
                "{} {}, {}",
                self.bold("Summary:"),
                counts,
                self.error(&format!("{} error{}", errors, if errors == 1 { "" } else { "s" }))
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AlternativeSuggestion, MutationResult, OutlierRecord, ProjectSummary, ResolvedRange,
    };
    use crate::error::{ManifestError, MutationError};
    use semver::Version;
    use std::path::PathBuf;

    fn render_analysis(verbosity: Verbosity, run: &AnalysisRun) -> String {
        let mut buf = Vec::new();
        TextFormatter::with_color(verbosity, false)
            .format_analysis(run, &mut buf)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn render_apply(run: &ApplyRun) -> String {
        let mut buf = Vec::new();
        TextFormatter::with_color(Verbosity::Normal, false)
            .format_apply(run, &mut buf)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn sample_report() -> AnalysisReport {
        let mut report = AnalysisReport::new("/work/app");
        report.project_name = Some("app".to_string());
        report.root_constraint = Some(">=16.0.0".to_string());
        report.constraint_count = 3;
        report.range = ResolvedRange::between(Version::new(18, 0, 0), Version::new(24, 0, 0));
        report.current_runtime = Some(Version::new(18, 0, 0));
        report.upgrade_options = vec![Version::new(20, 0, 0), Version::new(22, 0, 0)];

        let mut red = DependencyUpdateInfo::new("request", "2.88.2");
        red.health = HealthTier::Red;
        red.available_updates = vec![Version::new(3, 0, 0)];
        red.latest_version = Some(Version::new(4, 0, 0));
        red.node_compatibility_note = Some("4.0.0 needs node >=26.0.0".to_string());
        red.alternatives = vec![AlternativeSuggestion::new(
            "got",
            "latest",
            "request is deprecated",
            "packman.toml",
        )];
        let mut green = DependencyUpdateInfo::new("lodash", "4.17.21");
        green.health = HealthTier::Green;
        report.dependencies = vec![red, green];

        report.outliers = vec![OutlierRecord {
            package_name: "sharp".to_string(),
            package_version: "0.33.0".to_string(),
            constraint: ">=18.0.0".to_string(),
            impact: "raises the minimum from 16.0.0 to 18.0.0".to_string(),
            range_without_dependency: ResolvedRange::between(
                Version::new(16, 0, 0),
                Version::new(24, 0, 0),
            ),
        }];
        report
    }

    fn single(report: AnalysisReport) -> AnalysisRun {
        AnalysisRun {
            reports: vec![report],
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_analysis_normal() {
        let output = render_analysis(Verbosity::Normal, &single(sample_report()));

        assert!(output.contains("app (/work/app)"));
        assert!(output.contains("Node.js range  >=18.0.0 <=24.0.0 (from 3 engine constraints)"));
        assert!(output.contains("engines.node   >=16.0.0"));
        assert!(output.contains("can move to 20.0.0, 22.0.0"));
        assert!(output.contains("1 red, 0 orange, 0 yellow, 1 green, 0 unknown"));
        assert!(output.contains("request"));
        assert!(output.contains("2.88.2 → 3.0.0 [red] (latest 4.0.0)"));
        assert!(output.contains("4.0.0 needs node >=26.0.0"));
        assert!(output.contains("↳ consider got@latest: request is deprecated [packman.toml]"));
        assert!(output.contains("Range outliers"));
        assert!(output.contains("sharp@0.33.0 node >=18.0.0"));
        assert!(output.contains("without it: >=16.0.0 <=24.0.0"));
        // green dependencies are only listed in verbose mode
        assert!(!output.contains("lodash"));
        assert!(!output.contains("Summary:"));
    }

    #[test]
    fn test_analysis_verbose_lists_green() {
        let output = render_analysis(Verbosity::Verbose, &single(sample_report()));
        assert!(output.contains("lodash"));
        assert!(output.contains("[green]"));
    }

    #[test]
    fn test_analysis_quiet() {
        let output = render_analysis(Verbosity::Quiet, &single(sample_report()));
        assert!(output.contains("Node.js range"));
        assert!(!output.contains("request"));
        assert!(!output.contains("Range outliers"));
    }

    #[test]
    fn test_analysis_contradiction_warning() {
        let mut report = sample_report();
        report.range = ResolvedRange::empty();
        let output = render_analysis(Verbosity::Normal, &single(report));
        assert!(output.contains("Node.js range  none"));
        assert!(output.contains("no Node.js version satisfies all 3 engine constraints"));
    }

    #[test]
    fn test_analysis_unconstrained() {
        let mut report = AnalysisReport::new("/work/lib");
        report.current_runtime = Some(Version::new(20, 0, 0));
        let output = render_analysis(Verbosity::Normal, &single(report));
        assert!(output.contains("/work/lib"));
        assert!(output.contains("unconstrained"));
        assert!(output.contains("Runtime        20.0.0"));
        assert!(!output.contains("outside the range"));
    }

    #[test]
    fn test_analysis_multi_project_summary() {
        let run = AnalysisRun {
            reports: vec![sample_report()],
            failures: vec![ProjectFailure {
                project_path: PathBuf::from("/work/broken"),
                message: "failed to parse JSON".to_string(),
            }],
        };
        let output = render_analysis(Verbosity::Normal, &run);
        assert!(output.contains("✗ /work/broken: failed to parse JSON"));
        assert!(output.contains(
            "Summary: 1 projects analyzed, 1 red dependencies, 1 range outliers, 1 failed"
        ));
    }

    #[test]
    fn test_apply_outcome() {
        let done = MutationOperation::update("a", "^1.0.0", "2.0.0");
        let broken = MutationOperation::update("b", "^1.0.0", "9.9.9");
        let skipped = MutationOperation::replace("c", "^1.0.0", "d", "1.0.0");

        let mut result = MutationResult::new();
        result.record_success(done.clone());
        result.record_failure(
            broken.clone(),
            MutationError::ConfigMutation {
                source: ManifestError::entry_not_found("package.json", "b", "dependencies"),
            },
        );
        let summary = ProjectSummary::from_result("/work/app", &result);

        let run = ApplyRun {
            outcomes: vec![ApplyOutcome {
                report: None,
                queue: vec![done, broken, skipped],
                result,
                engines: None,
                summary,
            }],
            failures: Vec::new(),
        };
        let output = render_apply(&run);

        assert!(output.contains("✓ update a ^1.0.0 -> 2.0.0"));
        assert!(output.contains("✗ update b ^1.0.0 -> 9.9.9 [config_mutation]"));
        assert!(output.contains("'b' not found in dependencies"));
        assert!(output.contains("replace c with d@1.0.0 (not attempted)"));
        assert!(output.contains("Summary: 1 updated, 0 replaced, engines.node set in 0 projects, 1 error"));
    }

    #[test]
    fn test_apply_engines_only() {
        let mut summary = ProjectSummary::new("/work/app");
        summary.engines_updated = true;
        let run = ApplyRun {
            outcomes: vec![ApplyOutcome {
                report: None,
                queue: Vec::new(),
                result: MutationResult::new(),
                engines: Some(">=18.0.0 <=24.0.0".to_string()),
                summary,
            }],
            failures: Vec::new(),
        };
        let output = render_apply(&run);
        assert!(output.contains("✓ engines.node set to >=18.0.0 <=24.0.0"));
        assert!(output.contains("engines.node set in 1 project"));
        assert!(!output.contains("error"));
    }

    #[test]
    fn test_apply_nothing_to_do() {
        let run = ApplyRun {
            outcomes: vec![ApplyOutcome {
                report: None,
                queue: Vec::new(),
                result: MutationResult::new(),
                engines: None,
                summary: ProjectSummary::new("/work/app"),
            }],
            failures: Vec::new(),
        };
        assert!(render_apply(&run).contains("nothing to apply"));
    }
}
