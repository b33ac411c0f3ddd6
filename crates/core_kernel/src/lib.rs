//! Core Kernel - Foundational types shared by every CID crate
//!
//! This crate provides the building blocks used across the domain, infrastructure
//! and interface layers:
//! - Claim identifiers that sort by issuance time
//! - Content hashes used as the document identity and dedup key
//! - Port infrastructure for swappable adapters (stores, insurer clients)

pub mod identifiers;
pub mod hashing;
pub mod ports;
pub mod error;

pub use identifiers::ClaimId;
pub use hashing::ContentHash;
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
pub use error::CoreError;
