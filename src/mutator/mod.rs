//! Transactional manifest mutation
//!
//! Applies queued updates and replacements to one project, one operation at
//! a time. Each operation edits package.json, runs the package manager and
//! either commits or restores the manifest and lockfile verbatim. The run
//! stops at the first failed operation.

mod snapshot;

pub use snapshot::{RestoreFailure, Snapshot};

use crate::domain::{DependencyType, DependencyTypeLookup, MutationOperation, MutationResult};
use crate::error::{ManifestError, MutationError};
use crate::manifest::{write_manifest, PackageJson, MANIFEST_FILE};
use crate::package_manager::{CommandResult, PackageManagerRunner};
use std::path::{Path, PathBuf};

/// Applies mutation operations to the project at `project_dir`
pub struct ManifestMutator<'a> {
    project_dir: PathBuf,
    runner: &'a dyn PackageManagerRunner,
}

impl<'a> ManifestMutator<'a> {
    /// Creates a mutator for `project_dir` using `runner` for installs
    pub fn new(project_dir: impl Into<PathBuf>, runner: &'a dyn PackageManagerRunner) -> Self {
        Self {
            project_dir: project_dir.into(),
            runner,
        }
    }

    /// Project directory
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Apply `operations` in order, halting at the first failure
    pub fn apply(
        &self,
        operations: &[MutationOperation],
        types: &dyn DependencyTypeLookup,
    ) -> MutationResult {
        let mut result = MutationResult::new();

        for (index, operation) in operations.iter().enumerate() {
            tracing::info!(operation = %operation, "applying");
            match self.apply_one(operation, types) {
                Ok(()) => result.record_success(operation.clone()),
                Err(error) => {
                    tracing::warn!(operation = %operation, error = %error, "operation failed");
                    result.record_failure(operation.clone(), error);
                    let skipped = operations.len() - index - 1;
                    if skipped > 0 {
                        tracing::warn!(skipped, "halting remaining operations");
                    }
                    break;
                }
            }
        }
        result
    }

    /// Write `range` into `engines.node`
    pub fn set_engines(&self, range: &str) -> Result<(), MutationError> {
        let manifest = self.read_manifest()?;
        let updated = manifest
            .with_engines(range)
            .map_err(|source| MutationError::ConfigMutation { source })?;

        let snapshot = self.capture(&manifest, None)?;
        if let Err(error) = write_manifest(manifest.path(), &updated) {
            return Err(roll_back(snapshot, MutationError::ConfigWrite { source: error }));
        }
        snapshot.commit();
        tracing::info!(range, "engines.node updated");
        Ok(())
    }

    fn apply_one(
        &self,
        operation: &MutationOperation,
        types: &dyn DependencyTypeLookup,
    ) -> Result<(), MutationError> {
        let manifest = self.read_manifest()?;
        let dep_type = types.dependency_type_or_default(operation.package_name());

        let updated = match operation {
            MutationOperation::Update {
                name,
                target_version,
                ..
            } => manifest.with_updated_version(dep_type, name, target_version),
            MutationOperation::Replace {
                original_name,
                alternative_name,
                alternative_version,
                ..
            } => manifest.with_replacement(
                dep_type,
                original_name,
                alternative_name,
                alternative_version,
            ),
        }
        .map_err(|source| MutationError::ConfigMutation { source })?;

        let lockfile = self.runner.lockfile_path(&self.project_dir);
        let snapshot = self.capture(&manifest, Some(&lockfile))?;

        if let Err(error) = write_manifest(manifest.path(), &updated) {
            return Err(roll_back(snapshot, MutationError::ConfigWrite { source: error }));
        }

        if let Err(error) = self.run_package_manager(operation, dep_type) {
            return Err(roll_back(snapshot, error));
        }

        snapshot.commit();
        Ok(())
    }

    fn run_package_manager(
        &self,
        operation: &MutationOperation,
        dep_type: DependencyType,
    ) -> Result<(), MutationError> {
        match operation {
            MutationOperation::Update {
                name,
                target_version,
                ..
            } => check(
                self.runner
                    .install(name, target_version, dep_type, &self.project_dir),
            ),
            MutationOperation::Replace {
                original_name,
                alternative_name,
                alternative_version,
                ..
            } => {
                check(
                    self.runner
                        .uninstall(original_name, dep_type, &self.project_dir),
                )?;
                check(self.runner.install(
                    alternative_name,
                    alternative_version,
                    DependencyType::Production,
                    &self.project_dir,
                ))
            }
        }
    }

    fn read_manifest(&self) -> Result<PackageJson, MutationError> {
        PackageJson::read(&self.project_dir).map_err(|source| MutationError::ConfigRead { source })
    }

    fn capture(
        &self,
        manifest: &PackageJson,
        lockfile: Option<&Path>,
    ) -> Result<Snapshot, MutationError> {
        Snapshot::capture(manifest.path(), lockfile).map_err(|e| MutationError::ConfigRead {
            source: ManifestError::read_error(self.project_dir.join(MANIFEST_FILE), e),
        })
    }
}

fn check(result: CommandResult) -> Result<(), MutationError> {
    if result.success {
        Ok(())
    } else {
        Err(MutationError::external_command(
            result.command,
            result.exit_code,
            result.stderr.trim(),
        ))
    }
}

fn roll_back(snapshot: Snapshot, error: MutationError) -> MutationError {
    tracing::warn!(error = %error, "rolling back package.json and lockfile");
    match snapshot.restore() {
        Ok(()) => error,
        Err(failure) => {
            tracing::error!(
                path = %failure.path.display(),
                error = %failure.source,
                "rollback failed; the project may need a manual reinstall"
            );
            error.into_rollback(failure.path, failure.source)
        }
    }
}
