//! Submission repository implementation
//!
//! Row-level SQL for `cid_submissions` and `cid_documents`. Declarations,
//! expected providers and responses are stored as JSONB; the document bytes
//! live in their own table keyed by content hash.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use core_kernel::{ClaimId, ContentHash};
use domain_cid::{CidData, CidDocument, CidStatus, CidSubmission, InsuranceCompany, ProviderResponse};

use crate::error::DatabaseError;

/// Unique constraint guarding one submission per document
pub const CONTENT_HASH_CONSTRAINT: &str = "cid_submissions_content_hash_key";

/// Primary key constraint on the claim id
pub const CLAIM_ID_CONSTRAINT: &str = "cid_submissions_pkey";

const SELECT_COLUMNS: &str = r#"
    SELECT
        claim_id,
        content_hash,
        status,
        cid_data,
        expected_providers,
        provider_responses,
        size_bytes,
        created_at,
        updated_at
    FROM cid_submissions
"#;

/// Row in `cid_submissions`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubmissionRow {
    pub claim_id: Uuid,
    pub content_hash: String,
    pub status: String,
    pub cid_data: Json<CidData>,
    pub expected_providers: Json<Vec<InsuranceCompany>>,
    pub provider_responses: Json<Vec<ProviderResponse>>,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for CidSubmission {
    type Error = DatabaseError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let content_hash = row
            .content_hash
            .parse::<ContentHash>()
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;
        let status = row
            .status
            .parse::<CidStatus>()
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;
        let size_bytes = u64::try_from(row.size_bytes)
            .map_err(|_| DatabaseError::SerializationError(format!("negative size {}", row.size_bytes)))?;

        Ok(CidSubmission {
            claim_id: ClaimId::from_uuid(row.claim_id),
            cid_data: row.cid_data.0,
            document: CidDocument {
                content_hash,
                size_bytes,
            },
            status,
            expected_providers: row.expected_providers.0,
            provider_responses: row.provider_responses.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for CID submissions and their documents
#[derive(Debug, Clone)]
pub struct SubmissionRepository {
    pool: PgPool,
}

impl SubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Stores document bytes; storing the same hash twice is a no-op
    pub async fn insert_document<'e, E: PgExecutor<'e>>(
        executor: E,
        hash: &ContentHash,
        content: &[u8],
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO cid_documents (content_hash, content, size_bytes)
            VALUES ($1, $2, $3)
            ON CONFLICT (content_hash) DO NOTHING
            "#,
        )
        .bind(hash.as_str())
        .bind(content)
        .bind(content.len() as i64)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Inserts a new submission row
    ///
    /// # Errors
    ///
    /// `DuplicateEntry` naming [`CONTENT_HASH_CONSTRAINT`] or
    /// [`CLAIM_ID_CONSTRAINT`] when either is already taken
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        submission: &CidSubmission,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO cid_submissions (
                claim_id, content_hash, status, cid_data, expected_providers,
                provider_responses, size_bytes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(submission.claim_id.as_uuid())
        .bind(submission.content_hash().as_str())
        .bind(submission.status.as_str())
        .bind(Json(&submission.cid_data))
        .bind(Json(&submission.expected_providers))
        .bind(Json(&submission.provider_responses))
        .bind(submission.document.size_bytes as i64)
        .bind(submission.created_at)
        .bind(submission.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Reads one row and locks it until the surrounding transaction ends
    pub async fn fetch_for_update<'e, E: PgExecutor<'e>>(
        executor: E,
        claim_id: ClaimId,
    ) -> Result<CidSubmission, DatabaseError> {
        let sql = format!("{SELECT_COLUMNS} WHERE claim_id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(claim_id.as_uuid())
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Submission", claim_id))?;

        row.try_into()
    }

    /// Writes back the mutable state of a submission
    pub async fn update_state<'e, E: PgExecutor<'e>>(
        executor: E,
        submission: &CidSubmission,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE cid_submissions
            SET status = $2, provider_responses = $3, updated_at = $4
            WHERE claim_id = $1
            "#,
        )
        .bind(submission.claim_id.as_uuid())
        .bind(submission.status.as_str())
        .bind(Json(&submission.provider_responses))
        .bind(submission.updated_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Submission", submission.claim_id));
        }
        Ok(())
    }

    pub async fn get(&self, claim_id: ClaimId) -> Result<CidSubmission, DatabaseError> {
        let sql = format!("{SELECT_COLUMNS} WHERE claim_id = $1");
        let row = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(claim_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Submission", claim_id))?;

        row.try_into()
    }

    pub async fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<CidSubmission>, DatabaseError> {
        let sql = format!("{SELECT_COLUMNS} WHERE content_hash = $1");
        sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(hash.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(CidSubmission::try_from)
            .transpose()
    }

    /// All submissions, newest first
    pub async fn list(&self) -> Result<Vec<CidSubmission>, DatabaseError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY created_at DESC, claim_id DESC");
        sqlx::query_as::<_, SubmissionRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(CidSubmission::try_from)
            .collect()
    }

    pub async fn document(&self, hash: &ContentHash) -> Result<Option<Vec<u8>>, DatabaseError> {
        let content = sqlx::query_scalar::<_, Vec<u8>>(
            "SELECT content FROM cid_documents WHERE content_hash = $1",
        )
        .bind(hash.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(content)
    }
}
