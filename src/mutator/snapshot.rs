//! Verbatim file snapshots restored on failure
//!
//! A `Snapshot` is armed when captured. `commit` disarms it; `restore` puts
//! every captured file back and reports the first failure. Dropping an armed
//! snapshot restores best-effort.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A file that could not be put back
#[derive(Error, Debug)]
#[error("failed to restore {path}: {source}")]
pub struct RestoreFailure {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug)]
struct CapturedFile {
    path: PathBuf,
    /// None if the file did not exist at capture time
    content: Option<Vec<u8>>,
}

impl CapturedFile {
    fn restore(&self) -> io::Result<()> {
        match &self.content {
            Some(bytes) => fs::write(&self.path, bytes),
            None => match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        }
    }
}

/// Scoped guard over a manifest and an optional lockfile
#[derive(Debug)]
pub struct Snapshot {
    files: Vec<CapturedFile>,
    armed: bool,
}

impl Snapshot {
    /// Capture `manifest` (must exist) and `lockfile` (may be absent)
    pub fn capture(manifest: &Path, lockfile: Option<&Path>) -> io::Result<Self> {
        let mut files = vec![CapturedFile {
            path: manifest.to_path_buf(),
            content: Some(fs::read(manifest)?),
        }];

        if let Some(lockfile) = lockfile {
            let content = match fs::read(lockfile) {
                Ok(bytes) => Some(bytes),
                Err(e) if e.kind() == io::ErrorKind::NotFound => None,
                Err(e) => return Err(e),
            };
            files.push(CapturedFile {
                path: lockfile.to_path_buf(),
                content,
            });
        }

        Ok(Self { files, armed: true })
    }

    /// Keep the current state of the files
    pub fn commit(mut self) {
        self.armed = false;
    }

    /// Put every captured file back, continuing past failures
    pub fn restore(mut self) -> Result<(), RestoreFailure> {
        self.armed = false;
        self.restore_all()
    }

    fn restore_all(&self) -> Result<(), RestoreFailure> {
        let mut first_failure = None;
        for file in &self.files {
            if let Err(source) = file.restore() {
                tracing::error!(path = %file.path.display(), error = %source, "restore failed");
                first_failure.get_or_insert(RestoreFailure {
                    path: file.path.clone(),
                    source,
                });
            }
        }
        match first_failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("snapshot dropped without commit, restoring");
            let _ = self.restore_all();
        }
    }
}
