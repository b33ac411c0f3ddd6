//! Simulated insurer with a generic acknowledgement format

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::time::Duration;

use core_kernel::{DomainPort, PortError};
use domain_cid::InsuranceCompany;

use super::{short_reference, simulate_latency};
use crate::insurer::{ClaimPayload, InsurerClient, InsurerDecision};

/// Simulated insurer for companies without a dedicated adapter
///
/// References look like `GENERALI-1a2b3c4d`.
#[derive(Debug, Clone)]
pub struct GenericInsurerAdapter {
    provider: InsuranceCompany,
    latency: Duration,
}

impl GenericInsurerAdapter {
    pub fn new(provider: InsuranceCompany, latency: Duration) -> Self {
        Self { provider, latency }
    }
}

impl DomainPort for GenericInsurerAdapter {}

#[async_trait]
impl InsurerClient for GenericInsurerAdapter {
    fn provider(&self) -> InsuranceCompany {
        self.provider
    }

    async fn submit_claim(&self, _payload: &ClaimPayload) -> Result<InsurerDecision, PortError> {
        simulate_latency(self.latency).await;

        let provider_claim_id = format!("{}-{}", self.provider.as_str().to_uppercase(), short_reference());
        Ok(InsurerDecision::Accepted {
            message: format!("CID successfully submitted to {}", self.provider.display_name()),
            raw_response: json!({
                "claimId": provider_claim_id,
                "status": "received",
                "estimatedProcessingTime": "3-5 business days",
                "referenceNumber": format!("REF-{provider_claim_id}"),
                "submissionTimestamp": Utc::now().to_rfc3339(),
                "acknowledgment": format!("Claim received by {}", self.provider),
            }),
            provider_claim_id,
        })
    }
}
