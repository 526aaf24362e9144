//! Per-project analysis report and run summary

use super::{DependencyUpdateInfo, HealthTier, MutationResult, OutlierRecord, ResolvedRange};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of analyzing one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Project directory
    pub project_path: PathBuf,
    /// `name` from package.json
    pub project_name: Option<String>,
    /// `engines.node` from package.json
    pub root_constraint: Option<String>,
    /// Number of parseable engine constraints that fed the range
    pub constraint_count: usize,
    /// Intersection of all engine constraints
    pub range: ResolvedRange,
    /// Runtime currently on PATH
    pub current_runtime: Option<Version>,
    /// Runtime versions newer than the current one within the range
    pub upgrade_options: Vec<Version>,
    /// Health of each analyzed dependency
    pub dependencies: Vec<DependencyUpdateInfo>,
    /// Dependencies narrowing the range
    pub outliers: Vec<OutlierRecord>,
}

impl AnalysisReport {
    /// Creates an empty report for `project_path`
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            project_name: None,
            root_constraint: None,
            constraint_count: 0,
            range: ResolvedRange::empty(),
            current_runtime: None,
            upgrade_options: Vec::new(),
            dependencies: Vec::new(),
            outliers: Vec::new(),
        }
    }

    /// Returns true if constraints exist but no runtime satisfies all of them
    pub fn is_contradictory(&self) -> bool {
        self.constraint_count > 0 && self.range.is_empty()
    }

    /// Returns the number of dependencies in `tier`
    pub fn count_tier(&self, tier: HealthTier) -> usize {
        self.dependencies.iter().filter(|d| d.health == tier).count()
    }

    /// Returns true if `package` is flagged as an outlier
    pub fn is_outlier(&self, package: &str) -> bool {
        self.outliers.iter().any(|o| o.package_name == package)
    }

    /// Returns the health entry for `package`
    pub fn dependency(&self, package: &str) -> Option<&DependencyUpdateInfo> {
        self.dependencies.iter().find(|d| d.name == package)
    }
}

/// What happened to one project during `apply`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    /// Project directory
    pub project_path: PathBuf,
    /// Number of committed updates
    pub updates: usize,
    /// Number of committed replacements
    pub replacements: usize,
    /// Whether `engines.node` was rewritten
    pub engines_updated: bool,
    /// Failure messages
    pub errors: Vec<String>,
}

impl ProjectSummary {
    /// Creates an empty summary
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            ..Self::default()
        }
    }

    /// Builds a summary from a mutation result
    pub fn from_result(project_path: impl Into<PathBuf>, result: &MutationResult) -> Self {
        let mut summary = Self::new(project_path);
        for op in &result.succeeded {
            if op.is_replace() {
                summary.replacements += 1;
            } else {
                summary.updates += 1;
            }
        }
        summary.errors = result
            .failed
            .iter()
            .map(|f| format!("{}: {}", f.operation, f.error))
            .collect();
        summary
    }

    /// Returns true if anything changed on disk
    pub fn has_changes(&self) -> bool {
        self.updates > 0 || self.replacements > 0 || self.engines_updated
    }

    /// Returns true if any error was recorded
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
