//! Queued manifest mutations and their outcome

use crate::error::{ConfigError, MutationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One edit to apply to a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationOperation {
    /// Change the version of an existing dependency
    Update {
        name: String,
        current_version: String,
        target_version: String,
    },
    /// Swap a dependency for another package
    Replace {
        original_name: String,
        original_version: String,
        alternative_name: String,
        alternative_version: String,
    },
}

impl MutationOperation {
    /// Creates an Update operation
    pub fn update(
        name: impl Into<String>,
        current_version: impl Into<String>,
        target_version: impl Into<String>,
    ) -> Self {
        MutationOperation::Update {
            name: name.into(),
            current_version: current_version.into(),
            target_version: target_version.into(),
        }
    }

    /// Creates a Replace operation
    pub fn replace(
        original_name: impl Into<String>,
        original_version: impl Into<String>,
        alternative_name: impl Into<String>,
        alternative_version: impl Into<String>,
    ) -> Self {
        MutationOperation::Replace {
            original_name: original_name.into(),
            original_version: original_version.into(),
            alternative_name: alternative_name.into(),
            alternative_version: alternative_version.into(),
        }
    }

    /// Returns the package the operation acts on
    pub fn package_name(&self) -> &str {
        match self {
            MutationOperation::Update { name, .. } => name,
            MutationOperation::Replace { original_name, .. } => original_name,
        }
    }

    /// Returns true for replacements
    pub fn is_replace(&self) -> bool {
        matches!(self, MutationOperation::Replace { .. })
    }
}

impl fmt::Display for MutationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationOperation::Update {
                name,
                current_version,
                target_version,
            } => {
                if current_version.is_empty() {
                    write!(f, "update {} -> {}", name, target_version)
                } else {
                    write!(f, "update {} {} -> {}", name, current_version, target_version)
                }
            }
            MutationOperation::Replace {
                original_name,
                alternative_name,
                alternative_version,
                ..
            } => write!(
                f,
                "replace {} with {}@{}",
                original_name, alternative_name, alternative_version
            ),
        }
    }
}

/// An operation that failed, with its cause
#[derive(Debug)]
pub struct FailedOperation {
    /// The operation that was attempted
    pub operation: MutationOperation,
    /// Why it failed
    pub error: MutationError,
}

/// Outcome of applying an operation queue.
///
/// At most one operation ever fails: the queue halts at the first failure.
#[derive(Debug, Default)]
pub struct MutationResult {
    /// Operations applied and committed, in order
    pub succeeded: Vec<MutationOperation>,
    /// Operations that failed
    pub failed: Vec<FailedOperation>,
}

impl MutationResult {
    /// Creates an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a committed operation
    pub fn record_success(&mut self, operation: MutationOperation) {
        self.succeeded.push(operation);
    }

    /// Records a failed operation
    pub fn record_failure(&mut self, operation: MutationOperation, error: MutationError) {
        self.failed.push(FailedOperation { operation, error });
    }

    /// Returns true if nothing failed
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Returns true if a failure may have left the project half-mutated
    pub fn has_fatal_failure(&self) -> bool {
        self.failed.iter().any(|f| f.error.is_fatal())
    }
}

/// Ordered list of operations selected for one project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationQueue {
    operations: Vec<MutationOperation>,
}

impl OperationQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation, ignoring exact duplicates
    pub fn push(&mut self, operation: MutationOperation) {
        if !self.operations.contains(&operation) {
            self.operations.push(operation);
        }
    }

    /// Returns true if an operation for `package` is already queued
    pub fn contains_package(&self, package: &str) -> bool {
        self.operations.iter().any(|op| op.package_name() == package)
    }

    /// Returns the queued operations
    pub fn operations(&self) -> &[MutationOperation] {
        &self.operations
    }

    /// Returns the number of queued operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Consumes the queue
    pub fn into_operations(self) -> Vec<MutationOperation> {
        self.operations
    }
}

impl FromIterator<MutationOperation> for OperationQueue {
    fn from_iter<I: IntoIterator<Item = MutationOperation>>(iter: I) -> Self {
        let mut queue = OperationQueue::new();
        for op in iter {
            queue.push(op);
        }
        queue
    }
}

/// Splits `name@version` into its parts; scoped names keep their leading `@`
pub fn parse_package_spec(spec: &str) -> Result<(String, String), ConfigError> {
    let spec = spec.trim();
    let split_at = spec
        .char_indices()
        .skip(1)
        .filter(|(_, c)| *c == '@')
        .map(|(i, _)| i)
        .last()
        .ok_or_else(|| ConfigError::invalid_operation(spec, "expected NAME@VERSION"))?;

    let (name, version) = spec.split_at(split_at);
    let version = &version[1..];
    if name.is_empty() || version.is_empty() {
        return Err(ConfigError::invalid_operation(spec, "expected NAME@VERSION"));
    }
    Ok((name.to_string(), version.to_string()))
}

/// Parses `old=new@version` into its parts
pub fn parse_replace_spec(spec: &str) -> Result<(String, String, String), ConfigError> {
    let (original, alternative) = spec
        .split_once('=')
        .ok_or_else(|| ConfigError::invalid_operation(spec, "expected OLD=NEW@VERSION"))?;
    let original = original.trim();
    if original.is_empty() {
        return Err(ConfigError::invalid_operation(spec, "missing package to replace"));
    }
    let (name, version) = parse_package_spec(alternative)
        .map_err(|_| ConfigError::invalid_operation(spec, "expected OLD=NEW@VERSION"))?;
    Ok((original.to_string(), name, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_spec() {
        assert_eq!(
            parse_package_spec("lodash@4.17.21").unwrap(),
            ("lodash".to_string(), "4.17.21".to_string())
        );
    }

    #[test]
    fn test_parse_scoped_package_spec() {
        assert_eq!(
            parse_package_spec("@types/node@20.11.0").unwrap(),
            ("@types/node".to_string(), "20.11.0".to_string())
        );
    }

    #[test]
    fn test_parse_package_spec_invalid() {
        assert!(parse_package_spec("lodash").is_err());
        assert!(parse_package_spec("@types/node").is_err());
        assert!(parse_package_spec("lodash@").is_err());
    }

    #[test]
    fn test_parse_replace_spec() {
        assert_eq!(
            parse_replace_spec("request=got@14.0.0").unwrap(),
            (
                "request".to_string(),
                "got".to_string(),
                "14.0.0".to_string()
            )
        );
        assert!(parse_replace_spec("request").is_err());
        assert!(parse_replace_spec("=got@1.0.0").is_err());
        assert!(parse_replace_spec("request=got").is_err());
    }

    #[test]
    fn test_queue_ignores_duplicates() {
        let mut queue = OperationQueue::new();
        queue.push(MutationOperation::update("a", "1.0.0", "2.0.0"));
        queue.push(MutationOperation::update("a", "1.0.0", "2.0.0"));
        queue.push(MutationOperation::replace("b", "1.0.0", "c", "latest"));
        assert_eq!(queue.len(), 2);
        assert!(queue.contains_package("b"));
        assert!(!queue.contains_package("c"));
    }

    #[test]
    fn test_operation_display() {
        let op = MutationOperation::update("a", "1.0.0", "2.0.0");
        assert_eq!(format!("{}", op), "update a 1.0.0 -> 2.0.0");

        let op = MutationOperation::replace("request", "2.88.2", "got", "14.0.0");
        assert_eq!(format!("{}", op), "replace request with got@14.0.0");
    }

    #[test]
    fn test_mutation_result_records() {
        let mut result = MutationResult::new();
        assert!(result.is_success());
        result.record_success(MutationOperation::update("a", "1.0.0", "2.0.0"));
        result.record_failure(
            MutationOperation::update("b", "1.0.0", "2.0.0"),
            MutationError::external_command("npm install b@2.0.0 --save", Some(1), "E404"),
        );
        assert!(!result.is_success());
        assert!(!result.has_fatal_failure());
        assert_eq!(result.succeeded.len(), 1);
        assert_eq!(result.failed.len(), 1);
    }

    #[test]
    fn test_operation_serialization() {
        let op = MutationOperation::update("a", "1.0.0", "2.0.0");
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("\"type\":\"update\""));
        assert!(json.contains("\"target_version\":\"2.0.0\""));
    }
}
