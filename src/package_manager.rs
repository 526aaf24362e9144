//! Package manager integration for installing and removing dependencies
//!
//! This module provides:
//! - Detection of the project's package manager from its lockfile
//! - Command lines for install/uninstall per package manager and dependency type
//! - Execution of those commands

use crate::domain::DependencyType;
use crate::error::ConfigError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

/// Supported Node.js package managers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackageManagerKind {
    #[default]
    Npm,
    Yarn,
    Pnpm,
    Bun,
}

impl PackageManagerKind {
    /// Executable name
    pub fn program(&self) -> &'static str {
        match self {
            PackageManagerKind::Npm => "npm",
            PackageManagerKind::Yarn => "yarn",
            PackageManagerKind::Pnpm => "pnpm",
            PackageManagerKind::Bun => "bun",
        }
    }

    /// Lockfile names, preferred first
    pub fn lockfiles(&self) -> &'static [&'static str] {
        match self {
            PackageManagerKind::Npm => &["package-lock.json"],
            PackageManagerKind::Yarn => &["yarn.lock"],
            PackageManagerKind::Pnpm => &["pnpm-lock.yaml"],
            PackageManagerKind::Bun => &["bun.lockb", "bun.lock"],
        }
    }

    /// Detect the package manager from the lockfiles in `dir`; npm when none is present
    pub fn detect(dir: &Path) -> Self {
        [
            PackageManagerKind::Pnpm,
            PackageManagerKind::Yarn,
            PackageManagerKind::Bun,
            PackageManagerKind::Npm,
        ]
        .into_iter()
        .find(|kind| kind.lockfiles().iter().any(|f| dir.join(f).exists()))
        .unwrap_or_default()
    }

    /// Lockfile this package manager maintains in `dir`
    pub fn lockfile_path(&self, dir: &Path) -> PathBuf {
        let lockfiles = self.lockfiles();
        lockfiles
            .iter()
            .map(|f| dir.join(f))
            .find(|p| p.exists())
            .unwrap_or_else(|| dir.join(lockfiles[0]))
    }

    /// Arguments installing `package@version` as `dep_type`
    pub fn install_args(&self, package: &str, version: &str, dep_type: DependencyType) -> Vec<String> {
        let spec = format!("{}@{}", package, version);
        let (verb, flag) = match (self, dep_type) {
            (PackageManagerKind::Npm, DependencyType::Production) => ("install", "--save"),
            (PackageManagerKind::Npm, DependencyType::Development) => ("install", "--save-dev"),
            (PackageManagerKind::Npm, DependencyType::Optional) => ("install", "--save-optional"),
            (PackageManagerKind::Pnpm, DependencyType::Production) => ("add", "--save-prod"),
            (PackageManagerKind::Pnpm, DependencyType::Development) => ("add", "--save-dev"),
            (PackageManagerKind::Pnpm, DependencyType::Optional) => ("add", "--save-optional"),
            (PackageManagerKind::Yarn | PackageManagerKind::Bun, DependencyType::Production) => {
                return vec!["add".to_string(), spec];
            }
            (PackageManagerKind::Yarn | PackageManagerKind::Bun, DependencyType::Development) => {
                ("add", "--dev")
            }
            (PackageManagerKind::Yarn | PackageManagerKind::Bun, DependencyType::Optional) => {
                ("add", "--optional")
            }
        };
        vec![verb.to_string(), spec, flag.to_string()]
    }

    /// Arguments removing `package` from its `dep_type` section
    pub fn uninstall_args(&self, package: &str, dep_type: DependencyType) -> Vec<String> {
        let mut args = match self {
            PackageManagerKind::Npm => vec!["uninstall".to_string(), package.to_string()],
            _ => vec!["remove".to_string(), package.to_string()],
        };
        if *self == PackageManagerKind::Npm {
            let flag = match dep_type {
                DependencyType::Production => "--save",
                DependencyType::Development => "--save-dev",
                DependencyType::Optional => "--save-optional",
            };
            args.push(flag.to_string());
        }
        args
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program())
    }
}

impl FromStr for PackageManagerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "npm" => Ok(PackageManagerKind::Npm),
            "yarn" => Ok(PackageManagerKind::Yarn),
            "pnpm" => Ok(PackageManagerKind::Pnpm),
            "bun" => Ok(PackageManagerKind::Bun),
            _ => Err(ConfigError::InvalidPackageManager {
                value: s.to_string(),
            }),
        }
    }
}

/// Result of one package manager invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// The command that was executed
    pub command: String,
    /// Whether the command exited with status 0
    pub success: bool,
    /// Exit code, if the process ran to completion
    pub exit_code: Option<i32>,
    /// Standard output from the command
    pub stdout: String,
    /// Standard error from the command
    pub stderr: String,
}

impl CommandResult {
    /// Creates a successful result
    pub fn success(command: impl Into<String>, stdout: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Creates a failed result
    pub fn failure(command: impl Into<String>, exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            success: false,
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs package manager commands in a project directory
pub trait PackageManagerRunner {
    /// Install `package@version`, persisting it in `dep_type`'s section
    fn install(
        &self,
        package: &str,
        version: &str,
        dep_type: DependencyType,
        working_dir: &Path,
    ) -> CommandResult;

    /// Remove `package` from `dep_type`'s section
    fn uninstall(&self, package: &str, dep_type: DependencyType, working_dir: &Path) -> CommandResult;

    /// Lockfile the runner maintains in `working_dir`
    fn lockfile_path(&self, working_dir: &Path) -> PathBuf {
        PackageManagerKind::Npm.lockfile_path(working_dir)
    }
}

/// Runner that executes the real package manager
#[derive(Debug, Default, Clone)]
pub struct SystemPackageManager {
    kind: Option<PackageManagerKind>,
}

impl SystemPackageManager {
    /// Creates a runner that detects the package manager per project
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a runner that always uses `kind`
    pub fn with_kind(kind: PackageManagerKind) -> Self {
        Self { kind: Some(kind) }
    }

    /// Package manager used for `working_dir`
    pub fn kind_for(&self, working_dir: &Path) -> PackageManagerKind {
        self.kind
            .unwrap_or_else(|| PackageManagerKind::detect(working_dir))
    }

    fn run(&self, kind: PackageManagerKind, args: &[String], working_dir: &Path) -> CommandResult {
        let command_str = format!("{} {}", kind.program(), args.join(" "));
        tracing::info!(command = %command_str, dir = %working_dir.display(), "running package manager");

        match Command::new(kind.program())
            .args(args)
            .current_dir(working_dir)
            .output()
        {
            Ok(output) => CommandResult {
                command: command_str,
                success: output.status.success(),
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            },
            Err(e) => CommandResult::failure(
                command_str,
                None,
                format!("Failed to execute command: {}", e),
            ),
        }
    }
}

impl PackageManagerRunner for SystemPackageManager {
    fn install(
        &self,
        package: &str,
        version: &str,
        dep_type: DependencyType,
        working_dir: &Path,
    ) -> CommandResult {
        let kind = self.kind_for(working_dir);
        self.run(kind, &kind.install_args(package, version, dep_type), working_dir)
    }

    fn uninstall(&self, package: &str, dep_type: DependencyType, working_dir: &Path) -> CommandResult {
        let kind = self.kind_for(working_dir);
        self.run(kind, &kind.uninstall_args(package, dep_type), working_dir)
    }

    fn lockfile_path(&self, working_dir: &Path) -> PathBuf {
        self.kind_for(working_dir).lockfile_path(working_dir)
    }
}
