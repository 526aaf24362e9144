//! Core domain models for packman
//!
//! This module contains the fundamental types used throughout the application:
//! - Installed dependency records and dependency types
//! - Resolved runtime ranges
//! - Registry metadata
//! - Health classification and outlier results
//! - Mutation operations, results and summaries

mod health;
mod operation;
mod outlier;
mod range;
mod record;
mod registry_info;
mod report;

pub use health::{AlternativeSuggestion, DependencyUpdateInfo, HealthTier};
pub use operation::{
    parse_package_spec, parse_replace_spec, FailedOperation, MutationOperation, MutationResult,
    OperationQueue,
};
pub use outlier::OutlierRecord;
pub use range::ResolvedRange;
pub use record::{DependencyRecord, DependencyType, DependencyTypeLookup};
pub use registry_info::{RegistryInfo, VersionMeta};
pub use report::{AnalysisReport, ProjectSummary};
