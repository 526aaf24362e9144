//! Project files on disk
//!
//! This module provides functionality to:
//! - Read and edit package.json
//! - Scan installed dependencies from package-lock.json and node_modules
//! - Discover sub-projects for recursive runs

mod discovery;
mod lockfile;
mod package_json;

pub use discovery::{discover_projects, is_project, DEFAULT_DEPTH};
pub use lockfile::{scan_dependencies, LOCKFILE};
pub use package_json::{detect_indent, write_manifest, DirectDependency, PackageJson, MANIFEST_FILE};
