//! Simulated UnipolSai API

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::time::Duration;

use core_kernel::{DomainPort, PortError};
use domain_cid::InsuranceCompany;

use super::{short_reference, simulate_latency};
use crate::insurer::{ClaimPayload, InsurerClient, InsurerDecision};

/// UnipolSai acknowledges claims with an Italian-language `UNI-` receipt
#[derive(Debug, Clone, Default)]
pub struct UnipolSaiAdapter {
    latency: Duration,
}

impl UnipolSaiAdapter {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl DomainPort for UnipolSaiAdapter {}

#[async_trait]
impl InsurerClient for UnipolSaiAdapter {
    fn provider(&self) -> InsuranceCompany {
        InsuranceCompany::UnipolSai
    }

    async fn submit_claim(&self, _payload: &ClaimPayload) -> Result<InsurerDecision, PortError> {
        simulate_latency(self.latency).await;

        let provider_claim_id = format!("UNI-{}", short_reference());
        Ok(InsurerDecision::Accepted {
            message: "CID successfully submitted to UnipolSai".to_string(),
            raw_response: json!({
                "unipolClaimReference": provider_claim_id,
                "submissionStatus": "RICEVUTO",
                "praticaNumero": format!("PRT-{}", Utc::now().timestamp()),
                "tempoElaborazione": "2-4 giorni lavorativi",
            }),
            provider_claim_id,
        })
    }
}
