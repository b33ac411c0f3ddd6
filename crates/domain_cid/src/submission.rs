//! CID submission aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{ClaimId, ContentHash};
use crate::accident::AccidentDetails;
use crate::error::CidError;
use crate::person::{InsuranceCompany, PersonInfo};
use crate::status::CidStatus;

/// The declaration itself: both drivers and the accident
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CidData {
    pub person_a: PersonInfo,
    pub person_b: PersonInfo,
    pub accident_details: AccidentDetails,
}

impl CidData {
    /// Distinct insurers named by the two drivers, in order of first appearance
    pub fn insurers(&self) -> Vec<InsuranceCompany> {
        let mut insurers = vec![self.person_a.insurance_company];
        if self.person_b.insurance_company != self.person_a.insurance_company {
            insurers.push(self.person_b.insurance_company);
        }
        insurers
    }
}

/// Reference to the signed PDF; the bytes themselves are stored out of line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CidDocument {
    pub content_hash: ContentHash,
    pub size_bytes: u64,
}

impl CidDocument {
    pub fn for_bytes(bytes: &[u8]) -> Self {
        Self {
            content_hash: ContentHash::of(bytes),
            size_bytes: bytes.len() as u64,
        }
    }
}

/// Why an insurer call did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The insurer answered and declined the claim
    Rejected,
    /// No definitive answer was obtained
    Transport,
}

/// Outcome of dispatching one submission to one insurer
///
/// Recorded once per insurer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub provider: InsuranceCompany,
    pub success: bool,
    /// Claim id assigned by the insurer, present only on success
    #[serde(rename = "claim_id", default, skip_serializing_if = "Option::is_none")]
    pub provider_claim_id: Option<String>,
    /// Rejection reason or transport error, present only on failure
    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    pub message: String,
    /// Number of calls made before this outcome was reached
    pub attempts: u32,
    /// Provider-specific acknowledgement payload
    #[serde(default)]
    pub raw_response: serde_json::Value,
    #[serde(rename = "timestamp")]
    pub responded_at: DateTime<Utc>,
}

impl ProviderResponse {
    pub fn accepted(
        provider: InsuranceCompany,
        provider_claim_id: impl Into<String>,
        message: impl Into<String>,
        raw_response: serde_json::Value,
        attempts: u32,
    ) -> Self {
        Self {
            provider,
            success: true,
            provider_claim_id: Some(provider_claim_id.into()),
            error_detail: None,
            failure: None,
            message: message.into(),
            attempts,
            raw_response,
            responded_at: Utc::now(),
        }
    }

    pub fn rejected(
        provider: InsuranceCompany,
        reason: impl Into<String>,
        raw_response: serde_json::Value,
        attempts: u32,
    ) -> Self {
        let reason = reason.into();
        Self {
            provider,
            success: false,
            provider_claim_id: None,
            message: format!("CID rejected by {}", provider.display_name()),
            error_detail: Some(reason),
            failure: Some(FailureKind::Rejected),
            attempts,
            raw_response,
            responded_at: Utc::now(),
        }
    }

    pub fn transport_failure(provider: InsuranceCompany, detail: impl Into<String>, attempts: u32) -> Self {
        Self {
            provider,
            success: false,
            provider_claim_id: None,
            error_detail: Some(detail.into()),
            failure: Some(FailureKind::Transport),
            message: format!(
                "No definitive answer from {} after {} attempt(s)",
                provider.display_name(),
                attempts
            ),
            attempts,
            raw_response: serde_json::Value::Null,
            responded_at: Utc::now(),
        }
    }

    /// A definitive business "no"
    pub fn is_rejection(&self) -> bool {
        !self.success && self.failure == Some(FailureKind::Rejected)
    }

    pub fn is_transport_failure(&self) -> bool {
        !self.success && self.failure != Some(FailureKind::Rejected)
    }
}

/// A CID submission and its evolving dispatch state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CidSubmission {
    /// System-issued identifier
    pub claim_id: ClaimId,
    /// Declaration as submitted
    pub cid_data: CidData,
    /// Signed document reference
    pub document: CidDocument,
    /// Overall status
    pub status: CidStatus,
    /// Distinct insurers to dispatch to, in first-appearance order
    pub expected_providers: Vec<InsuranceCompany>,
    /// One entry per insurer that has an outcome, ordered like `expected_providers`
    pub provider_responses: Vec<ProviderResponse>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl CidSubmission {
    /// Creates a new pending submission with a freshly issued claim id
    pub fn new(cid_data: CidData, document: CidDocument) -> Self {
        let now = Utc::now();
        let expected_providers = cid_data.insurers();

        Self {
            claim_id: ClaimId::issue(),
            cid_data,
            document,
            status: CidStatus::Pending,
            expected_providers,
            provider_responses: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.document.content_hash
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// True once every expected insurer has an outcome
    pub fn is_fully_populated(&self) -> bool {
        self.provider_responses.len() == self.expected_providers.len()
    }

    pub fn response_for(&self, provider: InsuranceCompany) -> Option<&ProviderResponse> {
        self.provider_responses.iter().find(|r| r.provider == provider)
    }

    /// Marks the start of dispatch
    ///
    /// Idempotent while `submitted`; fails once the submission is terminal.
    pub fn mark_submitted(&mut self) -> Result<(), CidError> {
        match self.status {
            CidStatus::Submitted => Ok(()),
            _ => self.update_status(CidStatus::Submitted),
        }
    }

    /// Records one insurer's outcome and re-derives the status
    ///
    /// Responses are kept in `expected_providers` order whatever their arrival
    /// order. Once terminal the status is frozen, but outcomes of the remaining
    /// expected insurers are still recorded.
    pub fn record_response(&mut self, response: ProviderResponse) -> Result<(), CidError> {
        let Some(slot) = self
            .expected_providers
            .iter()
            .position(|p| *p == response.provider)
        else {
            return Err(CidError::UnknownInsurer {
                claim_id: self.claim_id,
                provider: response.provider,
            });
        };

        if self.response_for(response.provider).is_some() {
            return Err(CidError::DuplicateResponse {
                claim_id: self.claim_id,
                provider: response.provider,
            });
        }

        let insert_at = self
            .provider_responses
            .iter()
            .take_while(|existing| {
                self.expected_providers
                    .iter()
                    .position(|p| *p == existing.provider)
                    .is_some_and(|existing_slot| existing_slot < slot)
            })
            .count();
        self.provider_responses.insert(insert_at, response);
        self.updated_at = Utc::now();

        self.reevaluate_status();
        Ok(())
    }

    /// Applies the aggregator result if the state machine allows it
    fn reevaluate_status(&mut self) {
        if self.status.is_terminal() {
            return;
        }

        let next = CidStatus::aggregate(&self.expected_providers, &self.provider_responses);
        if next != self.status && self.status.can_transition_to(next) {
            debug!(claim_id = %self.claim_id, from = %self.status, to = %next, "CID status changed");
            self.status = next;
        }
    }

    fn update_status(&mut self, status: CidStatus) -> Result<(), CidError> {
        if !self.status.can_transition_to(status) {
            return Err(CidError::InvalidStatusTransition {
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }
}
