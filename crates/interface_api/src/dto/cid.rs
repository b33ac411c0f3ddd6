//! CID DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, ContentHash};
use domain_cid::{
    AccidentDetails, CidData, CidStatus, CidSubmission, InsuranceCompany, PersonInfo, ProviderResponse,
};
use domain_dispatch::{SubmitCid, SubmitOutcome, UploadedDocument};

/// Accident details as sent by clients; the time defaults to now
#[derive(Debug, Deserialize)]
pub struct AccidentDetailsRequest {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub circumstances: Vec<String>,
    #[serde(default)]
    pub damage_description: String,
}

#[derive(Debug, Deserialize)]
pub struct CidDataRequest {
    pub person_a: PersonInfo,
    pub person_b: PersonInfo,
    pub accident_details: AccidentDetailsRequest,
}

#[derive(Debug, Deserialize)]
pub struct SubmitCidRequest {
    pub cid_data: CidDataRequest,
    #[serde(default)]
    pub pdf_base64: String,
    #[serde(default)]
    pub pdf_hash: Option<String>,
}

impl From<SubmitCidRequest> for SubmitCid {
    fn from(request: SubmitCidRequest) -> Self {
        let accident = request.cid_data.accident_details;
        SubmitCid {
            cid_data: CidData {
                person_a: request.cid_data.person_a,
                person_b: request.cid_data.person_b,
                accident_details: AccidentDetails {
                    timestamp: accident.timestamp.unwrap_or_else(Utc::now),
                    location: accident.location,
                    description: accident.description,
                    circumstances: accident.circumstances,
                    damage_description: accident.damage_description,
                },
            },
            pdf_base64: request.pdf_base64,
            pdf_hash: request.pdf_hash,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitCidResponse {
    pub success: bool,
    pub claim_id: ClaimId,
    pub status: CidStatus,
    pub duplicate: bool,
    pub message: String,
    pub api_responses: Vec<ProviderResponse>,
    /// Insurers actually called while serving this request
    pub providers_contacted: usize,
}

impl From<SubmitOutcome> for SubmitCidResponse {
    fn from(outcome: SubmitOutcome) -> Self {
        let SubmitOutcome { submission, duplicate } = outcome;
        let (message, providers_contacted) = if duplicate {
            ("CID already submitted".to_string(), 0)
        } else {
            let contacted = submission
                .provider_responses
                .iter()
                .filter(|r| r.attempts > 0)
                .count();
            ("CID submitted successfully".to_string(), contacted)
        };

        Self {
            success: true,
            claim_id: submission.claim_id,
            status: submission.status,
            duplicate,
            message,
            api_responses: submission.provider_responses,
            providers_contacted,
        }
    }
}

/// Stored submission as returned by the query endpoints
#[derive(Debug, Serialize)]
pub struct CidRecordResponse {
    pub claim_id: ClaimId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: CidStatus,
    pub pdf_hash: ContentHash,
    pub pdf_size: u64,
    pub cid_data: CidData,
    pub expected_providers: Vec<InsuranceCompany>,
    pub api_responses: Vec<ProviderResponse>,
}

impl From<CidSubmission> for CidRecordResponse {
    fn from(submission: CidSubmission) -> Self {
        Self {
            claim_id: submission.claim_id,
            created_at: submission.created_at,
            updated_at: submission.updated_at,
            status: submission.status,
            pdf_hash: submission.document.content_hash,
            pdf_size: submission.document.size_bytes,
            cid_data: submission.cid_data,
            expected_providers: submission.expected_providers,
            api_responses: submission.provider_responses,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadPdfResponse {
    pub filename: String,
    pub size: u64,
    pub hash: ContentHash,
    pub base64: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_claim_id: Option<ClaimId>,
}

impl From<UploadedDocument> for UploadPdfResponse {
    fn from(document: UploadedDocument) -> Self {
        Self {
            filename: document.filename,
            size: document.size,
            hash: document.hash,
            base64: document.base64,
            content_type: document.content_type,
            existing_claim_id: document.existing_claim_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub id: InsuranceCompany,
    pub name: &'static str,
    /// Whether a client is registered for this insurer
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderInfo>,
    pub total_providers: usize,
}
