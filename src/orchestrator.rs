//! Workflow coordination for analysis and mutation
//!
//! This module provides:
//! - Workflow coordination: scan → resolve → fetch → classify → detect outliers
//! - Parallel registry queries bounded by a semaphore
//! - Planning of operation queues from CLI specs or from an analysis
//! - Applying a queue through the transactional mutator
//! - Project selection for recursive runs

use crate::cli::ScopeArgs;
use crate::compat::{OutlierDetector, RangeResolver};
use crate::config::DEFAULT_CONCURRENCY;
use crate::domain::{
    parse_package_spec, parse_replace_spec, AlternativeSuggestion, AnalysisReport,
    DependencyRecord, DependencyType, MutationOperation, MutationResult, OperationQueue,
    ProjectSummary, RegistryInfo, ResolvedRange,
};
use crate::error::{AppError, ConfigError, IoError, ManifestError};
use crate::manifest::{
    discover_projects, is_project, scan_dependencies, PackageJson, DEFAULT_DEPTH, MANIFEST_FILE,
};
use crate::mutator::ManifestMutator;
use crate::package_manager::PackageManagerRunner;
use crate::progress::Progress;
use crate::registry::RegistryClient;
use crate::update::HealthClassifier;
use semver::Version;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// What `apply` should do in each project
#[derive(Debug, Clone, Default)]
pub struct ApplyPlan {
    /// `name@version` specs
    pub updates: Vec<String>,
    /// `old=new@version` specs
    pub replaces: Vec<String>,
    /// Plan updates from an analysis
    pub all_highest: bool,
    /// Write the resolved range into engines.node afterwards
    pub set_engines: bool,
}

/// Result of `apply` for one project
#[derive(Debug)]
pub struct ApplyOutcome {
    /// Analysis made for planning, if any
    pub report: Option<AnalysisReport>,
    /// Operations attempted, in order
    pub queue: Vec<MutationOperation>,
    /// Mutator outcome
    pub result: MutationResult,
    /// Range written into engines.node
    pub engines: Option<String>,
    /// Counts for the end-of-run summary
    pub summary: ProjectSummary,
}

/// A project that could not be processed at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFailure {
    /// Project directory
    pub project_path: PathBuf,
    /// Error message
    pub message: String,
}

/// Reports of an `analyze` run over one or more projects
#[derive(Debug, Default)]
pub struct AnalysisRun {
    pub reports: Vec<AnalysisReport>,
    pub failures: Vec<ProjectFailure>,
}

impl AnalysisRun {
    /// Returns true if any project failed or has contradictory constraints
    pub fn has_problems(&self) -> bool {
        !self.failures.is_empty() || self.reports.iter().any(|r| r.is_contradictory())
    }
}

/// Outcomes of an `apply` run over one or more projects
#[derive(Debug, Default)]
pub struct ApplyRun {
    pub outcomes: Vec<ApplyOutcome>,
    pub failures: Vec<ProjectFailure>,
}

impl ApplyRun {
    /// Per-project summaries in processing order
    pub fn summaries(&self) -> Vec<&ProjectSummary> {
        self.outcomes.iter().map(|o| &o.summary).collect()
    }

    /// Returns true if any project or operation failed
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty() || self.outcomes.iter().any(|o| o.summary.has_errors())
    }
}

/// Coordinates scanning, registry lookups, classification and mutation
pub struct Orchestrator {
    registry: Arc<dyn RegistryClient>,
    resolver: RangeResolver,
    classifier: HealthClassifier,
    scope: Option<ScopeArgs>,
    concurrency: usize,
    current_runtime: Option<Version>,
    show_progress: bool,
}

impl Orchestrator {
    /// Creates an orchestrator querying `registry`
    pub fn new(registry: Arc<dyn RegistryClient>) -> Self {
        Self {
            registry,
            resolver: RangeResolver::new(),
            classifier: HealthClassifier::new(),
            scope: None,
            concurrency: DEFAULT_CONCURRENCY,
            current_runtime: None,
            show_progress: false,
        }
    }

    /// Restrict dependency types and packages (builder pattern)
    pub fn with_scope(mut self, scope: ScopeArgs) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Set the maximum number of concurrent registry requests
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the runtime version used for upgrade options
    pub fn with_runtime(mut self, version: Option<Version>) -> Self {
        self.current_runtime = version;
        self
    }

    /// Show progress while querying the registry
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn includes(&self, dep: &DependencyRecord) -> bool {
        match &self.scope {
            Some(scope) => {
                scope.should_process_type(dep.dependency_type())
                    && scope.should_process_package(&dep.name)
            }
            None => true,
        }
    }

    /// Resolve the project range from installed engine constraints only
    pub fn resolve_project_range(
        &self,
        project_dir: &Path,
    ) -> Result<(Vec<DependencyRecord>, ResolvedRange, usize), AppError> {
        let records = scan_dependencies(project_dir)?;
        let constraints: Vec<&str> = records
            .iter()
            .filter_map(|r| r.engine_constraint.as_deref())
            .collect();
        let count = RangeResolver::valid_constraints(&constraints).len();
        let range = self.resolver.resolve(&constraints);
        Ok((records, range, count))
    }

    /// Analyze the project at `project_dir`
    pub async fn analyze(&self, project_dir: &Path) -> Result<AnalysisReport, AppError> {
        let (records, range, constraint_count) = self.resolve_project_range(project_dir)?;

        let mut report = AnalysisReport::new(project_dir);
        if let Some(root) = records.iter().find(|r| r.is_root) {
            report.project_name = Some(root.name.clone()).filter(|n| !n.is_empty());
            report.root_constraint = root.engine_constraint.clone();
        }
        report.constraint_count = constraint_count;
        report.range = range;
        if report.is_contradictory() {
            tracing::warn!(path = %project_dir.display(), "engine constraints have no common Node.js version");
        }

        let selected: Vec<&DependencyRecord> = records
            .iter()
            .filter(|r| !r.is_root && self.includes(r))
            .collect();

        let lookups = self.fetch_all(&selected).await;
        for dep in &selected {
            let info = lookups
                .info
                .get(&dep.name)
                .cloned()
                .unwrap_or_else(|| RegistryInfo::with_error("lookup did not complete"));
            let alternatives = lookups
                .alternatives
                .get(&(dep.name.clone(), dep.installed_version.clone()))
                .cloned()
                .unwrap_or_default();
            report
                .dependencies
                .push(self.classifier.classify(dep, &report.range, &info, alternatives));
        }

        let root_constraint = report.root_constraint.clone();
        report.outliers = OutlierDetector::new(&self.resolver)
            .detect(&records, &report.range, root_constraint.as_deref())
            .into_iter()
            .filter(|o| {
                records
                    .iter()
                    .find(|r| r.name == o.package_name && r.installed_version == o.package_version)
                    .map(|r| self.includes(r))
                    .unwrap_or(true)
            })
            .collect();

        if let Some(current) = &self.current_runtime {
            report.current_runtime = Some(current.clone());
            report.upgrade_options = self.resolver.upgrade_options(current, &report.range);
        }

        Ok(report)
    }

    /// Fetch registry info once per package name and alternatives once per
    /// installed version, since suggestions may depend on the version
    async fn fetch_all(&self, dependencies: &[&DependencyRecord]) -> Lookups {
        let mut wanted: Vec<(String, Vec<String>)> = Vec::new();
        for dep in dependencies {
            match wanted.iter_mut().find(|(name, _)| name == &dep.name) {
                Some((_, versions)) => {
                    if !versions.contains(&dep.installed_version) {
                        versions.push(dep.installed_version.clone());
                    }
                }
                None => wanted.push((dep.name.clone(), vec![dep.installed_version.clone()])),
            }
        }

        let mut progress = Progress::new(self.show_progress);
        progress.start(wanted.len() as u64, "Querying registry");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for (name, versions) in wanted {
            let registry = Arc::clone(&self.registry);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let info = registry.fetch_package_info(&name).await;
                let mut alternatives = Vec::with_capacity(versions.len());
                for installed in versions {
                    let suggestions = registry.fetch_package_alternatives(&name, &installed).await;
                    alternatives.push((installed, suggestions));
                }
                (name, info, alternatives)
            });
        }

        let mut lookups = Lookups::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, info, alternatives)) => {
                    progress.set_message(&format!("Checked {}", name));
                    for (installed, suggestions) in alternatives {
                        lookups
                            .alternatives
                            .insert((name.clone(), installed), suggestions);
                    }
                    lookups.info.insert(name, info);
                }
                Err(e) => tracing::error!(error = %e, "registry task failed"),
            }
            progress.inc();
        }
        progress.finish_and_clear();
        lookups
    }

    /// Apply `plan` to the project at `project_dir`
    pub async fn apply(
        &self,
        project_dir: &Path,
        plan: &ApplyPlan,
        runner: &dyn PackageManagerRunner,
    ) -> Result<ApplyOutcome, AppError> {
        let manifest = PackageJson::read(project_dir)?;
        let types = manifest.dependency_types();

        let mut queue = build_queue(&plan.updates, &plan.replaces, &manifest)?;
        let mut report = None;
        if plan.all_highest {
            let analysis = self.analyze(project_dir).await?;
            for op in plan_all_highest(&analysis, &types).into_operations() {
                queue.push(op);
            }
            report = Some(analysis);
        }

        let mutator = ManifestMutator::new(project_dir, runner);
        let mut progress = Progress::new(self.show_progress && !queue.is_empty());
        progress.spinner(&format!(
            "Applying {} change(s) in {}",
            queue.len(),
            project_dir.display()
        ));
        let result = mutator.apply(queue.operations(), &types);
        progress.finish_and_clear();
        let mut summary = ProjectSummary::from_result(project_dir, &result);

        let mut engines = None;
        if plan.set_engines && result.is_success() {
            let (_, range, _) = self.resolve_project_range(project_dir)?;
            match range.expression() {
                Some(expr) => match mutator.set_engines(expr) {
                    Ok(()) => {
                        summary.engines_updated = true;
                        engines = Some(expr.to_string());
                    }
                    Err(e) => summary.errors.push(format!("engines.node: {}", e)),
                },
                None => summary
                    .errors
                    .push("engines.node: no Node.js version satisfies every constraint".to_string()),
            }
        }

        Ok(ApplyOutcome {
            report,
            queue: queue.into_operations(),
            result,
            engines,
            summary,
        })
    }

    /// Analyze each project in turn. A failing project does not stop the run.
    pub async fn analyze_all(&self, project_dirs: &[PathBuf]) -> AnalysisRun {
        let mut run = AnalysisRun::default();
        for dir in project_dirs {
            tracing::info!(path = %dir.display(), "analyzing project");
            match self.analyze(dir).await {
                Ok(report) => run.reports.push(report),
                Err(e) => {
                    tracing::error!(path = %dir.display(), error = %e, "analysis failed");
                    run.failures.push(ProjectFailure {
                        project_path: dir.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        run
    }

    /// Apply `plan` to each project in turn. Projects are independent: a
    /// failure in one leaves the others untouched.
    pub async fn apply_all(
        &self,
        project_dirs: &[PathBuf],
        plan: &ApplyPlan,
        runner: &dyn PackageManagerRunner,
    ) -> ApplyRun {
        let mut run = ApplyRun::default();
        for dir in project_dirs {
            tracing::info!(path = %dir.display(), "applying changes");
            match self.apply(dir, plan, runner).await {
                Ok(outcome) => run.outcomes.push(outcome),
                Err(e) => {
                    tracing::error!(path = %dir.display(), error = %e, "apply failed");
                    run.failures.push(ProjectFailure {
                        project_path: dir.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        run
    }
}

/// Builds the queue for explicit `--update` and `--replace` specs.
///
/// Current versions are taken from the manifest's declared ranges.
pub fn build_queue(
    updates: &[String],
    replaces: &[String],
    manifest: &PackageJson,
) -> Result<OperationQueue, ConfigError> {
    let declared: HashMap<String, String> = manifest
        .direct_dependencies()
        .into_iter()
        .map(|d| (d.name, d.spec))
        .collect();
    let current = |name: &str| declared.get(name).cloned().unwrap_or_default();

    let mut queue = OperationQueue::new();
    for spec in updates {
        let (name, version) = parse_package_spec(spec)?;
        queue.push(MutationOperation::update(&name, current(&name), version));
    }
    for spec in replaces {
        let (original, alternative, version) = parse_replace_spec(spec)?;
        if original == alternative {
            return Err(ConfigError::invalid_operation(
                spec,
                "replacement must name a different package",
            ));
        }
        queue.push(MutationOperation::replace(
            &original,
            current(&original),
            alternative,
            version,
        ));
    }
    Ok(queue)
}

/// Plan an update to the highest compatible version for every direct
/// dependency that is not green or that narrows the project range.
///
/// Stable versions are preferred unless the installed version is a
/// pre-release.
pub fn plan_all_highest(
    report: &AnalysisReport,
    direct: &HashMap<String, DependencyType>,
) -> OperationQueue {
    let mut queue = OperationQueue::new();
    for dep in &report.dependencies {
        if !direct.contains_key(&dep.name) || queue.contains_package(&dep.name) {
            continue;
        }
        let wanted = dep.health != crate::domain::HealthTier::Green || report.is_outlier(&dep.name);
        if !wanted {
            continue;
        }

        let installed_prerelease = Version::parse(dep.installed_version.trim_start_matches('v'))
            .map(|v| !v.pre.is_empty())
            .unwrap_or(false);
        let target = dep
            .available_updates
            .iter()
            .find(|v| installed_prerelease || v.pre.is_empty());
        if let Some(target) = target {
            queue.push(MutationOperation::update(
                &dep.name,
                &dep.installed_version,
                target.to_string(),
            ));
        }
    }
    queue
}

/// Registry answers gathered for one analysis
#[derive(Default)]
struct Lookups {
    info: HashMap<String, RegistryInfo>,
    /// Keyed by package name and installed version
    alternatives: HashMap<(String, String), Vec<AlternativeSuggestion>>,
}

/// Directories to process: the root when it is a project, plus its
/// sub-projects when `recursive`
pub fn project_dirs(root: &Path, recursive: bool) -> Result<Vec<PathBuf>, AppError> {
    if !root.is_dir() {
        return Err(IoError::directory_not_found(root).into());
    }
    let mut dirs = Vec::new();
    if is_project(root) {
        dirs.push(root.to_path_buf());
    }
    if recursive {
        // nested unreadable directories are skipped, an unreadable root is not
        std::fs::read_dir(root).map_err(|e| IoError::generic(root, e))?;
        dirs.extend(discover_projects(root, DEFAULT_DEPTH));
    }
    if dirs.is_empty() {
        return Err(ManifestError::not_found(root.join(MANIFEST_FILE)).into());
    }
    Ok(dirs)
}
