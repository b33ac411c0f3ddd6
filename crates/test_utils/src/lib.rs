//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! CID dispatch test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built drivers, accidents and documents
//! - `builders`: Builder patterns for declarations, intake requests and services
//! - `database`: Database test helpers and container management
//! - `assertions`: Custom assertion helpers for submissions
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
