//! packman - Node.js runtime compatibility analyzer library
//!
//! This library provides the core functionality for:
//! - Resolving the Node.js range accepted by every installed package
//! - Classifying dependency health against the npm registry
//! - Detecting dependencies that narrow the range
//! - Updating and replacing dependencies with snapshot rollback

pub mod cli;
pub mod compat;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod mutator;
pub mod orchestrator;
pub mod output;
pub mod package_manager;
pub mod progress;
pub mod registry;
pub mod update;
