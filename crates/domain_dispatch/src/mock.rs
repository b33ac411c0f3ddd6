//! Scripted insurer for tests

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use core_kernel::{DomainPort, PortError};
use domain_cid::InsuranceCompany;

use crate::insurer::{ClaimPayload, InsurerClient, InsurerDecision};

/// One scripted answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Accept under the given insurer claim id
    Accept(String),
    /// Decline with the given reason
    Reject(String),
    /// Never answer, so the per-call deadline fires
    Hang,
    /// Fail with a transient error
    Unavailable,
    /// Fail with a non-transient error
    Unauthorized,
}

/// Insurer that plays back a queue of [`Step`]s, one per call
///
/// When the queue runs dry every further call fails with `ServiceUnavailable`.
#[derive(Debug)]
pub struct ScriptedInsurer {
    provider: InsuranceCompany,
    steps: Mutex<VecDeque<Step>>,
    latency: Duration,
    calls: AtomicU32,
}

impl ScriptedInsurer {
    pub fn new(provider: InsuranceCompany, steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            provider,
            steps: Mutex::new(steps.into_iter().collect()),
            latency: Duration::ZERO,
            calls: AtomicU32::new(0),
        }
    }

    /// Always accepts with the given id
    pub fn accepting(provider: InsuranceCompany, claim_id: impl Into<String>) -> Self {
        Self::new(provider, [Step::Accept(claim_id.into())])
    }

    /// Delays every answer
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of calls received so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DomainPort for ScriptedInsurer {}

#[async_trait]
impl InsurerClient for ScriptedInsurer {
    fn provider(&self) -> InsuranceCompany {
        self.provider
    }

    async fn submit_claim(&self, _payload: &ClaimPayload) -> Result<InsurerDecision, PortError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().await.pop_front();

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match step {
            Some(Step::Accept(provider_claim_id)) => Ok(InsurerDecision::Accepted {
                message: format!("accepted by {}", self.provider),
                raw_response: json!({ "claim_id": provider_claim_id }),
                provider_claim_id,
            }),
            Some(Step::Reject(reason)) => Ok(InsurerDecision::Rejected {
                raw_response: json!({ "reason": reason }),
                reason,
            }),
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Unauthorized) => Err(PortError::Unauthorized {
                message: format!("{} refused the scripted token", self.provider),
            }),
            Some(Step::Unavailable) | None => Err(PortError::ServiceUnavailable {
                service: self.provider.to_string(),
            }),
        }
    }
}
