//! PostgreSQL Submission Store
//!
//! Implements the `SubmissionStore` port with the `SubmissionRepository`.
//!
//! # Error Handling
//!
//! Database errors are translated to `CidError`:
//! - unique violation on the content hash -> `CidError::DuplicateDocument`
//! - unique violation on the claim id -> `CidError::ClaimIdCollision`
//! - missing row -> `CidError::NotFound`
//! - anything else -> `CidError::Storage`

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};

use core_kernel::{
    AdapterHealth, ClaimId, ContentHash, DomainPort, HealthCheckResult, HealthCheckable,
};
use domain_cid::{CidError, CidSubmission, ProviderResponse, SubmissionStore};

use crate::error::DatabaseError;
use crate::repositories::submissions::{
    SubmissionRepository, CLAIM_ID_CONSTRAINT, CONTENT_HASH_CONSTRAINT,
};

/// PostgreSQL-backed implementation of the SubmissionStore port
#[derive(Debug, Clone)]
pub struct PostgresSubmissionStore {
    repository: SubmissionRepository,
    pool: PgPool,
}

impl PostgresSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: SubmissionRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &SubmissionRepository {
        &self.repository
    }

    /// Locks the row, applies `change`, and writes the result back in one transaction
    async fn mutate<F>(&self, claim_id: ClaimId, change: F) -> Result<CidSubmission, CidError>
    where
        F: FnOnce(&mut CidSubmission) -> Result<(), CidError> + Send,
    {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let mut submission = SubmissionRepository::fetch_for_update(&mut *tx, claim_id).await?;
        change(&mut submission)?;
        SubmissionRepository::update_state(&mut *tx, &submission).await?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        Ok(submission)
    }
}

impl DomainPort for PostgresSubmissionStore {}

#[async_trait]
impl HealthCheckable for PostgresSubmissionStore {
    /// Checks database connectivity with a `SELECT 1`
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-submission-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-submission-store".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl SubmissionStore for PostgresSubmissionStore {
    #[instrument(skip(self, submission, document), fields(claim_id = %submission.claim_id))]
    async fn create(&self, submission: CidSubmission, document: Vec<u8>) -> Result<CidSubmission, CidError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        SubmissionRepository::insert_document(&mut *tx, submission.content_hash(), &document).await?;

        match SubmissionRepository::insert(&mut *tx, &submission).await {
            Ok(()) => {
                tx.commit()
                    .await
                    .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
                info!(providers = ?submission.expected_providers, "Submission created");
                Ok(submission)
            }
            Err(e) if e.violates(CONTENT_HASH_CONSTRAINT) => {
                drop(tx);
                let existing = self
                    .repository
                    .find_by_hash(submission.content_hash())
                    .await?
                    .ok_or_else(|| CidError::not_found(submission.content_hash()))?;
                debug!(existing = %existing.claim_id, "Document already submitted");
                Err(CidError::DuplicateDocument(Box::new(existing)))
            }
            Err(e) if e.violates(CLAIM_ID_CONSTRAINT) => {
                warn!("Claim id collision");
                Err(CidError::ClaimIdCollision(submission.claim_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn mark_submitted(&self, claim_id: ClaimId) -> Result<CidSubmission, CidError> {
        self.mutate(claim_id, |submission| submission.mark_submitted()).await
    }

    #[instrument(skip(self, response), fields(provider = %response.provider, success = response.success))]
    async fn record_response(
        &self,
        claim_id: ClaimId,
        response: ProviderResponse,
    ) -> Result<CidSubmission, CidError> {
        let updated = self
            .mutate(claim_id, move |submission| submission.record_response(response))
            .await?;
        debug!(status = %updated.status, "Response recorded");
        Ok(updated)
    }

    async fn get(&self, claim_id: ClaimId) -> Result<CidSubmission, CidError> {
        Ok(self.repository.get(claim_id).await?)
    }

    async fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<CidSubmission>, CidError> {
        Ok(self.repository.find_by_hash(hash).await?)
    }

    async fn list(&self) -> Result<Vec<CidSubmission>, CidError> {
        Ok(self.repository.list().await?)
    }

    async fn document(&self, hash: &ContentHash) -> Result<Vec<u8>, CidError> {
        self.repository
            .document(hash)
            .await?
            .ok_or_else(|| CidError::DocumentNotFound(hash.clone()))
    }
}
