//! Schema migrations
//!
//! Migrations are plain SQL files embedded at compile time and applied in
//! order with `sqlx::raw_sql`. Each file is written to be re-runnable.

use sqlx::PgPool;
use tracing::info;

use crate::error::DatabaseError;

/// Embedded migrations, in application order
pub const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_cid_submissions",
    include_str!("../migrations/0001_cid_submissions.sql"),
)];

/// Tables created by [`MIGRATIONS`], children first
pub const TABLES: &[&str] = &["cid_submissions", "cid_documents"];

/// Applies every embedded migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), DatabaseError> {
    for (name, sql) in MIGRATIONS {
        info!(migration = name, "Applying migration");
        sqlx::raw_sql(sql)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::MigrationFailed(format!("{name}: {e}")))?;
    }
    Ok(())
}
