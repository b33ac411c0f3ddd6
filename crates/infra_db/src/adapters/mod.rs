//! Domain Adapters
//!
//! Adapter implementations for domain ports, connecting domain interfaces to
//! the PostgreSQL database layer. Each adapter:
//!
//! - Implements the domain's port trait
//! - Translates between domain models and database row types
//! - Uses the repository layer for database operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresSubmissionStore;
//! use domain_cid::SubmissionStore;
//!
//! let store = PostgresSubmissionStore::new(pool);
//! let submission = store.get(claim_id).await?;
//! ```

pub mod submission_store;

pub use submission_store::PostgresSubmissionStore;
