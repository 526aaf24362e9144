//! Installed dependency scanning
//!
//! Builds one `DependencyRecord` per installed package from
//! `package-lock.json` (lockfile versions 2 and 3, `packages` map). Engine
//! constraints come from the installed copy's own package.json under
//! `node_modules`, falling back to the `engines` recorded in the lockfile.
//! Without a lockfile, the installed copies of the direct dependencies are
//! read instead.

use super::package_json::{PackageJson, MANIFEST_FILE};
use crate::domain::{DependencyRecord, DependencyType};
use crate::error::ManifestError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// npm lockfile name
pub const LOCKFILE: &str = "package-lock.json";

const NODE_MODULES: &str = "node_modules/";

#[derive(Debug, Deserialize)]
struct Lockfile {
    #[serde(default)]
    packages: BTreeMap<String, LockEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockEntry {
    name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    dev: bool,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    dev_optional: bool,
    engines: Option<Value>,
}

/// Installed package.json, only the fields we read
#[derive(Debug, Default, Deserialize)]
struct InstalledManifest {
    version: Option<String>,
    engines: Option<Value>,
}

fn node_engine(engines: Option<&Value>) -> Option<String> {
    engines?.get("node")?.as_str().map(str::to_string)
}

/// Scan the installed dependencies of the project at `project_dir`.
///
/// The first record is always the project itself (`is_root`), carrying the
/// `engines.node` of the project's package.json.
pub fn scan_dependencies(project_dir: &Path) -> Result<Vec<DependencyRecord>, ManifestError> {
    let manifest = PackageJson::read(project_dir)?;
    let lockfile_path = project_dir.join(LOCKFILE);

    let mut records = vec![root_record(project_dir, &manifest)];
    if lockfile_path.is_file() {
        let content = fs::read_to_string(&lockfile_path)
            .map_err(|e| ManifestError::read_error(&lockfile_path, e))?;
        let lockfile: Lockfile = serde_json::from_str(&content)
            .map_err(|e| ManifestError::json_parse_error(&lockfile_path, e.to_string()))?;
        records.extend(records_from_lockfile(project_dir, &manifest, lockfile));
    } else {
        tracing::debug!(path = %project_dir.display(), "no lockfile, reading installed direct dependencies");
        records.extend(records_from_node_modules(project_dir, &manifest));
    }

    tracing::debug!(
        path = %project_dir.display(),
        count = records.len() - 1,
        "scanned installed dependencies"
    );
    Ok(records)
}

fn root_record(project_dir: &Path, manifest: &PackageJson) -> DependencyRecord {
    let name = manifest
        .name()
        .map(str::to_string)
        .or_else(|| {
            project_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_default();
    let version = manifest.version().unwrap_or_default();

    let record = DependencyRecord::root(name, version);
    match manifest.engine_constraint() {
        Some(constraint) => record.with_engine(constraint),
        None => record,
    }
}

fn records_from_lockfile(
    project_dir: &Path,
    manifest: &PackageJson,
    lockfile: Lockfile,
) -> Vec<DependencyRecord> {
    let root_dev: Vec<String> = manifest
        .direct_dependencies()
        .into_iter()
        .filter(|d| d.section == DependencyType::Development.section())
        .map(|d| d.name)
        .collect();

    let mut records = Vec::new();
    for (key, entry) in lockfile.packages {
        if !key.starts_with(NODE_MODULES) {
            continue;
        }
        let Some(version) = entry.version.clone() else {
            continue;
        };
        let name = entry
            .name
            .clone()
            .unwrap_or_else(|| package_name_from_path(&key).to_string());

        let installed = read_installed(&project_dir.join(&key));
        let engine = node_engine(installed.engines.as_ref())
            .or_else(|| node_engine(entry.engines.as_ref()));

        let is_dev = entry.dev || entry.dev_optional || root_dev.contains(&name);
        let mut record = DependencyRecord::new(name, version)
            .with_path(key)
            .with_dev(is_dev)
            .with_optional(entry.optional || entry.dev_optional);
        if let Some(engine) = engine {
            record = record.with_engine(engine);
        }
        records.push(record);
    }
    records
}

fn records_from_node_modules(project_dir: &Path, manifest: &PackageJson) -> Vec<DependencyRecord> {
    let types = manifest.dependency_types();
    let mut names: Vec<&String> = types.keys().collect();
    names.sort();

    let mut records = Vec::new();
    for name in names {
        let key = format!("{}{}", NODE_MODULES, name);
        let installed = read_installed(&project_dir.join(&key));
        let Some(version) = installed.version else {
            tracing::debug!(package = %name, "not installed, skipping");
            continue;
        };

        let dep_type = types[name];
        let mut record = DependencyRecord::new(name.as_str(), version)
            .with_dev(dep_type == DependencyType::Development)
            .with_optional(dep_type == DependencyType::Optional);
        if let Some(engine) = node_engine(installed.engines.as_ref()) {
            record = record.with_engine(engine);
        }
        records.push(record);
    }
    records
}

fn read_installed(package_dir: &Path) -> InstalledManifest {
    let path = package_dir.join(MANIFEST_FILE);
    let Ok(content) = fs::read_to_string(&path) else {
        return InstalledManifest::default();
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::debug!(path = %path.display(), error = %e, "unreadable installed package.json");
        InstalledManifest::default()
    })
}

/// `node_modules/a/node_modules/@s/b` -> `@s/b`
fn package_name_from_path(key: &str) -> &str {
    key.rsplit_once(NODE_MODULES)
        .map(|(_, name)| name)
        .unwrap_or(key)
}
