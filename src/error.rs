//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: Issues reading, parsing or editing package.json
//! - RegistryError: Issues with package registry communication
//! - ConfigError: Issues with CLI and packman.toml configuration
//! - ConstraintError: Unparseable engine constraints
//! - IoError: File system operation failures
//! - MutationError: Failures of a single queued manifest mutation

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest file related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Package registry related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors related to manifest and lockfile operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("manifest file not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write manifest file
    #[error("failed to write manifest file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },

    /// The manifest root is valid JSON but not an object
    #[error("unexpected manifest structure in {path}: {message}")]
    InvalidStructure { path: PathBuf, message: String },

    /// Dependency entry absent from the expected section
    #[error("'{package}' not found in {section} of {path}")]
    EntryNotFound {
        path: PathBuf,
        package: String,
        section: String,
    },
}

/// Errors related to package registry communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Package not found in registry
    #[error("package '{package}' not found in {registry} registry")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry} registry")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the configuration file
    #[error("failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// Malformed --update / --replace operation
    #[error("invalid operation '{value}': {message}")]
    InvalidOperation { value: String, message: String },

    /// Unknown dependency type in --types
    #[error("invalid dependency type '{value}': expected 'prod', 'dev' or 'optional'")]
    InvalidDependencyType { value: String },

    /// Unknown package manager name
    #[error("invalid package manager '{value}': expected 'npm', 'yarn', 'pnpm' or 'bun'")]
    InvalidPackageManager { value: String },

    /// Conflicting options
    #[error("conflicting options: {message}")]
    ConflictingOptions { message: String },
}

/// An engine constraint that cannot be parsed as an npm range
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version constraint '{input}': {message}")]
pub struct ConstraintError {
    pub input: String,
    pub message: String,
}

impl ConstraintError {
    /// Creates a new ConstraintError
    pub fn new(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            message: message.into(),
        }
    }
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// Directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Generic IO error
    #[error("IO error at {path}: {source}")]
    Generic {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of one queued mutation operation.
///
/// `ConfigRead` and `ConfigMutation` happen before anything is written.
/// `ConfigWrite` and `ExternalCommand` trigger a snapshot restore. `Rollback`
/// means the restore itself failed and the project may be left half-mutated.
#[derive(Error, Debug)]
pub enum MutationError {
    /// Manifest missing or unparseable
    #[error("cannot read manifest: {source}")]
    ConfigRead {
        #[source]
        source: ManifestError,
    },

    /// Target entry absent in its section
    #[error("cannot modify manifest: {source}")]
    ConfigMutation {
        #[source]
        source: ManifestError,
    },

    /// Writing the modified manifest failed
    #[error("cannot write manifest: {source}")]
    ConfigWrite {
        #[source]
        source: ManifestError,
    },

    /// Package manager exited non-zero or could not be spawned
    #[error("command `{command}` failed{}: {stderr}", exit_suffix(.exit_code))]
    ExternalCommand {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Restoring the snapshot failed
    #[error("rollback failed after '{cause}': could not restore {path}: {source}")]
    Rollback {
        cause: Box<MutationError>,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_suffix(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

impl ManifestError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ManifestError::NotFound { path: path.into() }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new JsonParseError
    pub fn json_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::JsonParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new EntryNotFound error
    pub fn entry_not_found(
        path: impl Into<PathBuf>,
        package: impl Into<String>,
        section: impl Into<String>,
    ) -> Self {
        ManifestError::EntryNotFound {
            path: path.into(),
            package: package.into(),
            section: section.into(),
        }
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(registry: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            registry: registry.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Returns true if the registry does not know the package
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::PackageNotFound { .. })
    }
}

impl ConfigError {
    /// Creates a new InvalidOperation error
    pub fn invalid_operation(value: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidOperation {
            value: value.into(),
            message: message.into(),
        }
    }
}

impl IoError {
    /// Creates a new DirectoryNotFound error
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        IoError::DirectoryNotFound { path: path.into() }
    }

    /// Creates a new Generic IO error
    pub fn generic(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Generic {
            path: path.into(),
            source,
        }
    }
}

impl MutationError {
    /// Creates an ExternalCommand error
    pub fn external_command(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        MutationError::ExternalCommand {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Wraps this error as the cause of a failed restore
    pub fn into_rollback(self, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MutationError::Rollback {
            cause: Box::new(self),
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable kind name
    pub fn kind(&self) -> &'static str {
        match self {
            MutationError::ConfigRead { .. } => "config_read",
            MutationError::ConfigMutation { .. } => "config_mutation",
            MutationError::ConfigWrite { .. } => "config_write",
            MutationError::ExternalCommand { .. } => "external_command",
            MutationError::Rollback { .. } => "rollback",
        }
    }

    /// Returns true if the project may be left in a partially mutated state
    pub fn is_fatal(&self) -> bool {
        matches!(self, MutationError::Rollback { .. })
    }
}
