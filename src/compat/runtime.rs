//! Detection of the Node.js runtime on PATH

use semver::Version;
use std::process::Command;

/// Parses the output of `node --version` (e.g. `v20.11.0`)
pub fn parse_runtime_version(output: &str) -> Option<Version> {
    let trimmed = output.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(trimmed).ok()
}

/// Returns the version of the `node` binary on PATH, if any
pub fn current_runtime_version() -> Option<Version> {
    let output = match Command::new("node").arg("--version").output() {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(error = %e, "node is not available");
            return None;
        }
    };
    if !output.status.success() {
        return None;
    }
    parse_runtime_version(&String::from_utf8_lossy(&output.stdout))
}
