//! CLI argument parsing module for packman

use crate::config::LogFormat;
use crate::domain::DependencyType;
use crate::error::ConfigError;
use crate::package_manager::PackageManagerKind;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parse one `--types` entry: prod, dev or optional
fn parse_dependency_type(s: &str) -> Result<DependencyType, String> {
    s.parse().map_err(|e: ConfigError| e.to_string())
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    s.parse()
}

fn parse_package_manager(s: &str) -> Result<PackageManagerKind, String> {
    s.parse().map_err(|e: ConfigError| e.to_string())
}

/// Node.js runtime compatibility analyzer and dependency updater
#[derive(Parser, Debug, Clone)]
#[command(
    name = "packman",
    version,
    about = "Node.js runtime compatibility analyzer and dependency updater"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (debug logging)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output, no progress
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Log format on stderr (pretty or json)
    #[arg(long, global = true, value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,

    /// Configuration file (default: <path>/packman.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// npm registry URL
    #[arg(long, global = true)]
    pub registry: Option<String>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Report the Node.js range, dependency health and range outliers
    Analyze(ScopeArgs),
    /// Apply updates and replacements with rollback on failure
    Apply(ApplyArgs),
}

/// Which projects and dependencies to look at
#[derive(Args, Debug, Clone)]
pub struct ScopeArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Also process sub-projects up to two levels below the path
    #[arg(short, long)]
    pub recursive: bool,

    /// Dependency types to include (comma separated: prod,dev,optional)
    #[arg(long, value_delimiter = ',', value_parser = parse_dependency_type)]
    pub types: Vec<DependencyType>,

    /// Exclude specific packages (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Process only specific packages (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub only: Vec<String>,
}

/// Arguments of `apply`
#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Update a dependency: name@version (can be specified multiple times)
    #[arg(long = "update", value_name = "NAME@VERSION", action = ArgAction::Append)]
    pub updates: Vec<String>,

    /// Replace a dependency: old=new@version (can be specified multiple times)
    #[arg(long = "replace", value_name = "OLD=NEW@VERSION", action = ArgAction::Append)]
    pub replaces: Vec<String>,

    /// Update every stale or range-narrowing dependency to its highest compatible version
    #[arg(long)]
    pub all_highest: bool,

    /// Write the resolved Node.js range into engines.node
    #[arg(long)]
    pub set_engines: bool,

    /// Package manager to run (default: detected from lockfile)
    #[arg(long, value_parser = parse_package_manager)]
    pub package_manager: Option<PackageManagerKind>,
}

impl ScopeArgs {
    /// Check if a dependency type should be processed
    pub fn should_process_type(&self, dep_type: DependencyType) -> bool {
        self.types.is_empty() || self.types.contains(&dep_type)
    }

    /// Check if a package should be processed based on filters
    pub fn should_process_package(&self, name: &str) -> bool {
        // If --only is specified, only process those packages
        if !self.only.is_empty() {
            return self.only.iter().any(|p| p == name);
        }
        !self.exclude.iter().any(|p| p == name)
    }
}

impl ApplyArgs {
    /// Reject option combinations that cannot be applied
    pub fn validate(&self) -> Result<(), ConfigError> {
        let explicit = !self.updates.is_empty() || !self.replaces.is_empty();
        if self.all_highest && explicit {
            return Err(ConfigError::ConflictingOptions {
                message: "--all-highest cannot be combined with --update or --replace".to_string(),
            });
        }
        if !explicit && !self.all_highest && !self.set_engines {
            return Err(ConfigError::ConflictingOptions {
                message: "nothing to apply: pass --update, --replace, --all-highest or --set-engines"
                    .to_string(),
            });
        }
        if self.scope.recursive && explicit {
            return Err(ConfigError::ConflictingOptions {
                message: "--update and --replace name packages of a single project; drop --recursive"
                    .to_string(),
            });
        }
        Ok(())
    }
}

impl CliArgs {
    /// Scope of the selected subcommand
    pub fn scope(&self) -> &ScopeArgs {
        match &self.command {
            Command::Analyze(scope) => scope,
            Command::Apply(apply) => &apply.scope,
        }
    }
}
