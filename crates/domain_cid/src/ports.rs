//! CID Domain Ports
//!
//! The `SubmissionStore` port owns every CID record and its evolving status.
//! Adapters:
//!
//! - **In-memory**: [`crate::store::InMemorySubmissionStore`], used in tests and
//!   when no database is configured
//! - **PostgreSQL**: `infra_db::PostgresSubmissionStore`
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_cid::ports::SubmissionStore;
//! use std::sync::Arc;
//!
//! pub struct CidService {
//!     store: Arc<dyn SubmissionStore>,
//! }
//!
//! impl CidService {
//!     pub async fn get(&self, id: ClaimId) -> Result<CidSubmission, CidError> {
//!         self.store.get(id).await
//!     }
//! }
//! ```

use async_trait::async_trait;

use core_kernel::{ClaimId, ContentHash, DomainPort, HealthCheckable};

use crate::error::CidError;
use crate::submission::{CidSubmission, ProviderResponse};

/// Durable record of every CID submission
///
/// Implementations serialize writes per claim id: recording a response and
/// re-deriving the status happen as one atomic unit, so concurrent dispatch
/// tasks never lose an outcome.
#[async_trait]
pub trait SubmissionStore: DomainPort + HealthCheckable {
    /// Persists a new submission together with its document bytes
    ///
    /// # Errors
    ///
    /// * `DuplicateDocument` with the existing record if the content hash is known
    /// * `ClaimIdCollision` if the claim id is already taken
    async fn create(&self, submission: CidSubmission, document: Vec<u8>) -> Result<CidSubmission, CidError>;

    /// Moves a record to `submitted` before dispatch starts
    async fn mark_submitted(&self, claim_id: ClaimId) -> Result<CidSubmission, CidError>;

    /// Appends one insurer outcome and re-derives the status
    ///
    /// # Errors
    ///
    /// * `UnknownInsurer` if the provider is not expected for this claim
    /// * `DuplicateResponse` if the provider already has an outcome
    /// * `NotFound` if the claim does not exist
    async fn record_response(
        &self,
        claim_id: ClaimId,
        response: ProviderResponse,
    ) -> Result<CidSubmission, CidError>;

    /// Retrieves a submission by claim id
    async fn get(&self, claim_id: ClaimId) -> Result<CidSubmission, CidError>;

    /// Looks a submission up by document hash
    async fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<CidSubmission>, CidError>;

    /// Lists all submissions, newest first
    async fn list(&self) -> Result<Vec<CidSubmission>, CidError>;

    /// Returns the raw document bytes stored for a hash
    async fn document(&self, hash: &ContentHash) -> Result<Vec<u8>, CidError>;
}
