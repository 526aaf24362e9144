//! Sub-project discovery
//!
//! Finds directories below a root that contain a package.json, as used by
//! `--recursive`. `node_modules` and hidden directories are never entered.

use super::package_json::MANIFEST_FILE;
use std::fs;
use std::path::{Path, PathBuf};

/// How many directory levels below the root are searched
pub const DEFAULT_DEPTH: usize = 2;

/// Returns true if `dir` contains a package.json
pub fn is_project(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file()
}

/// Returns the sub-project directories of `root` up to `max_depth` levels
/// deep, sorted. The root itself is not included.
pub fn discover_projects(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut projects = Vec::new();
    scan(root, 1, max_depth, &mut projects);
    projects.sort();
    projects
}

fn scan(dir: &Path, depth: usize, max_depth: usize, projects: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(path = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == "node_modules" || name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if is_project(&path) {
            projects.push(path.clone());
        }
        scan(&path, depth + 1, max_depth, projects);
    }
}
