//! Node.js runtime compatibility analysis
//!
//! This module provides:
//! - npm range parsing and intersection checks
//! - Resolution of the project runtime range from engine constraints
//! - Outlier detection for constraints that narrow the range
//! - Runtime upgrade options for the Node.js binary on PATH

mod constraint;
mod outlier;
mod resolver;
mod runtime;

pub use constraint::{intersects, Constraint};
pub use outlier::OutlierDetector;
pub use resolver::{
    default_candidates, upgrade_options, RangeResolver, CANDIDATE_MAJORS,
    CANDIDATE_TABLE_REVISION, KNOWN_LTS_RELEASES,
};
pub use runtime::{current_runtime_version, parse_runtime_version};
