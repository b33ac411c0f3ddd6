//! Repository implementations
//!
//! Repositories encapsulate SQL queries and map between database rows and
//! domain types. Mutations take any `PgExecutor` so callers can run them
//! inside a transaction.

pub mod submissions;

pub use submissions::{SubmissionRepository, SubmissionRow};
