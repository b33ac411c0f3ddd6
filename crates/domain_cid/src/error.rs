//! CID domain errors

use thiserror::Error;

use core_kernel::{ClaimId, ContentHash, PortError};
use crate::person::InsuranceCompany;
use crate::status::CidStatus;
use crate::submission::CidSubmission;

/// Errors that can occur in the CID domain
#[derive(Debug, Error)]
pub enum CidError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Declared document hash {declared} does not match received content {actual}")]
    HashMismatch { declared: String, actual: ContentHash },

    #[error("Document {} was already submitted as {}", .0.document.content_hash, .0.claim_id)]
    DuplicateDocument(Box<CidSubmission>),

    #[error("Insurer {provider} is not expected for claim {claim_id}")]
    UnknownInsurer { claim_id: ClaimId, provider: InsuranceCompany },

    #[error("Response from {provider} already recorded for claim {claim_id}")]
    DuplicateResponse { claim_id: ClaimId, provider: InsuranceCompany },

    #[error("Claim not found: {0}")]
    NotFound(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(ContentHash),

    #[error("Claim id already in use: {0}")]
    ClaimIdCollision(ClaimId),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: CidStatus, to: CidStatus },

    #[error("Storage error: {0}")]
    Storage(#[from] PortError),
}

impl CidError {
    pub fn validation(message: impl Into<String>) -> Self {
        CidError::Validation(vec![message.into()])
    }

    pub fn not_found(claim_id: impl std::fmt::Display) -> Self {
        CidError::NotFound(claim_id.to_string())
    }
}
