//! Simulated Allianz API

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use core_kernel::{DomainPort, PortError};
use domain_cid::InsuranceCompany;

use super::{short_reference, simulate_latency};
use crate::insurer::{ClaimPayload, InsurerClient, InsurerDecision};

/// Length of the attachment preview embedded in the request body
const ATTACHMENT_PREVIEW_LEN: usize = 100;

/// Allianz accepts every well-formed claim and answers with an `ALZ-` reference
#[derive(Debug, Clone, Default)]
pub struct AllianzAdapter {
    latency: Duration,
}

impl AllianzAdapter {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Request body in the shape the Allianz claims API expects
    pub fn request_body(payload: &ClaimPayload) -> Value {
        let preview: String = payload
            .document_base64
            .chars()
            .take(ATTACHMENT_PREVIEW_LEN)
            .collect();

        json!({
            "documentType": "CID",
            "externalReference": payload.claim_id,
            "claimData": {
                "parties": [
                    { "role": "party_a", "personalInfo": payload.person_a },
                    { "role": "party_b", "personalInfo": payload.person_b },
                ],
                "incident": payload.accident_details,
                "documentHash": payload.document_hash,
            },
            "attachments": [
                { "type": "signed_cid", "format": "pdf", "content": preview },
            ],
        })
    }
}

impl DomainPort for AllianzAdapter {}

#[async_trait]
impl InsurerClient for AllianzAdapter {
    fn provider(&self) -> InsuranceCompany {
        InsuranceCompany::Allianz
    }

    async fn submit_claim(&self, payload: &ClaimPayload) -> Result<InsurerDecision, PortError> {
        let body = Self::request_body(payload);
        debug!(claim_id = %payload.claim_id, bytes = body.to_string().len(), "Submitting to Allianz");
        simulate_latency(self.latency).await;

        let provider_claim_id = format!("ALZ-{}", short_reference());
        Ok(InsurerDecision::Accepted {
            message: "CID successfully submitted to Allianz".to_string(),
            raw_response: json!({
                "allianzClaimId": provider_claim_id,
                "status": "ACCEPTED",
                "processingReference": format!("ALZ-REF-{}", Utc::now().timestamp()),
                "estimatedResolution": "72 hours",
            }),
            provider_claim_id,
        })
    }
}
