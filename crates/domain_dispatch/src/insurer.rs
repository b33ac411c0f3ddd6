//! Insurer client contract

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, ContentHash, DomainPort, PortError};
use domain_cid::{AccidentDetails, CidSubmission, InsuranceCompany, PersonInfo};

/// Normalized claim sent to every insurer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimPayload {
    pub claim_id: ClaimId,
    pub person_a: PersonInfo,
    pub person_b: PersonInfo,
    pub accident_details: AccidentDetails,
    pub document_hash: ContentHash,
    /// The signed PDF, base64 encoded
    pub document_base64: String,
}

impl ClaimPayload {
    pub fn from_submission(submission: &CidSubmission, document: &[u8]) -> Self {
        Self {
            claim_id: submission.claim_id,
            person_a: submission.cid_data.person_a.clone(),
            person_b: submission.cid_data.person_b.clone(),
            accident_details: submission.cid_data.accident_details.clone(),
            document_hash: submission.document.content_hash.clone(),
            document_base64: STANDARD.encode(document),
        }
    }
}

/// A definitive answer from an insurer
#[derive(Debug, Clone, PartialEq)]
pub enum InsurerDecision {
    /// The insurer registered the claim under its own id
    Accepted {
        provider_claim_id: String,
        message: String,
        raw_response: serde_json::Value,
    },
    /// The insurer declined the claim; never retried
    Rejected {
        reason: String,
        raw_response: serde_json::Value,
    },
}

/// Uniform adapter over one insurer's API
///
/// `Ok` carries a definitive business answer. `Err` means no answer was
/// obtained; the dispatcher retries it when [`PortError::is_transient`] holds.
#[async_trait]
pub trait InsurerClient: DomainPort {
    /// Insurer served by this client
    fn provider(&self) -> InsuranceCompany;

    /// Submits one claim
    async fn submit_claim(&self, payload: &ClaimPayload) -> Result<InsurerDecision, PortError>;
}
