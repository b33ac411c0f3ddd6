//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for CID submissions using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: [`repositories`] holds the SQL and
//! row types, and [`adapters`] implements the domain's `SubmissionStore` port
//! on top of them.
//!
//! # Consistency
//!
//! Every mutation of a submission runs in a transaction that first locks the
//! row with `SELECT ... FOR UPDATE`, so concurrent dispatch tasks recording
//! outcomes for the same claim are serialized by the database.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{connect_and_migrate, PostgresSubmissionStore};
//!
//! let pool = connect_and_migrate("postgres://localhost/cid").await?;
//! let store = PostgresSubmissionStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod migrations;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, connect_and_migrate, DatabaseConfig};
pub use error::DatabaseError;
pub use migrations::run_migrations;
pub use repositories::SubmissionRepository;
pub use adapters::PostgresSubmissionStore;
