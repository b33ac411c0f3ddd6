//! Concurrent fan-out of a submission to its insurers

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use core_kernel::{ClaimId, PortError};
use domain_cid::{CidError, CidSubmission, InsuranceCompany, ProviderResponse, SubmissionStore};

use crate::insurer::{ClaimPayload, InsurerClient, InsurerDecision};
use crate::policy::RetryPolicy;
use crate::registry::InsurerRegistry;

/// Default bound on insurer calls in flight across the process
pub const DEFAULT_MAX_IN_FLIGHT: usize = 32;

/// Dispatches submissions to insurers and records every outcome
///
/// One task per distinct insurer runs concurrently; each individual attempt
/// holds a permit from a semaphore shared by every dispatch in the process.
/// Outcomes are written to the store as they arrive, and the store re-derives
/// the status after each one. At most one dispatch per claim runs at a time
/// across all clones of a dispatcher.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn SubmissionStore>,
    registry: Arc<InsurerRegistry>,
    policy: RetryPolicy,
    permits: Arc<Semaphore>,
    running: Arc<Mutex<HashSet<ClaimId>>>,
}

/// Marks a claim as being dispatched until dropped
struct RunningDispatch {
    running: Arc<Mutex<HashSet<ClaimId>>>,
    claim_id: ClaimId,
}

impl RunningDispatch {
    fn begin(running: &Arc<Mutex<HashSet<ClaimId>>>, claim_id: ClaimId) -> Option<Self> {
        let inserted = running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(claim_id);

        inserted.then(|| Self {
            running: Arc::clone(running),
            claim_id,
        })
    }
}

impl Drop for RunningDispatch {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.claim_id);
    }
}

impl Dispatcher {
    pub fn new(store: Arc<dyn SubmissionStore>, registry: Arc<InsurerRegistry>, policy: RetryPolicy) -> Self {
        Self {
            store,
            registry,
            policy,
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_IN_FLIGHT)),
            running: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Bounds total in-flight insurer calls
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max_in_flight.max(1)));
        self
    }

    pub fn registry(&self) -> &InsurerRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Dispatches a stored submission and returns its record afterwards
    ///
    /// Only insurers without a recorded outcome are called, so dispatching the
    /// same claim again resumes rather than duplicates. While another dispatch
    /// of the claim is running, the current record is returned untouched.
    ///
    /// Every outcome obtained is recorded before the first recording error, if
    /// any, is returned.
    #[instrument(skip(self))]
    pub async fn dispatch(&self, claim_id: ClaimId) -> Result<CidSubmission, CidError> {
        let Some(_running) = RunningDispatch::begin(&self.running, claim_id) else {
            debug!("Dispatch already running");
            return self.store.get(claim_id).await;
        };

        let submission = self.store.get(claim_id).await?;
        if submission.is_fully_populated() {
            debug!(status = %submission.status, "Nothing left to dispatch");
            return Ok(submission);
        }

        let submission = if submission.is_terminal() {
            submission
        } else {
            self.store.mark_submitted(claim_id).await?
        };

        let document = self.store.document(submission.content_hash()).await?;
        let payload = ClaimPayload::from_submission(&submission, &document);

        let outstanding: Vec<InsuranceCompany> = submission
            .expected_providers
            .iter()
            .copied()
            .filter(|p| submission.response_for(*p).is_none())
            .collect();
        info!(providers = ?outstanding, "Dispatching claim");

        let mut first_error = None;
        let mut calls = FuturesUnordered::new();
        for provider in outstanding {
            match self.registry.get(provider) {
                Some(client) => calls.push(self.call_with_retry(client, &payload)),
                None => {
                    warn!(%provider, "No insurer client registered");
                    let response = ProviderResponse::transport_failure(
                        provider,
                        format!("no client registered for {provider}"),
                        0,
                    );
                    if let Err(e) = self.record(claim_id, response).await {
                        first_error.get_or_insert(e);
                    }
                }
            }
        }

        while let Some(response) = calls.next().await {
            if let Err(e) = self.record(claim_id, response).await {
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let submission = self.store.get(claim_id).await?;
        info!(status = %submission.status, "Dispatch complete");
        Ok(submission)
    }

    async fn record(&self, claim_id: ClaimId, response: ProviderResponse) -> Result<(), CidError> {
        let provider = response.provider;
        match self.store.record_response(claim_id, response).await {
            Ok(updated) => {
                debug!(%provider, status = %updated.status, "Outcome recorded");
                Ok(())
            }
            Err(CidError::DuplicateResponse { .. }) => {
                warn!(%provider, "Outcome already recorded by a concurrent dispatch");
                Ok(())
            }
            Err(e) => {
                error!(%provider, error = %e, "Failed to record outcome");
                Err(e)
            }
        }
    }

    /// Calls one insurer until it answers definitively or attempts run out
    async fn call_with_retry(&self, client: Arc<dyn InsurerClient>, payload: &ClaimPayload) -> ProviderResponse {
        let provider = client.provider();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.attempt(client.as_ref(), payload).await {
                Ok(InsurerDecision::Accepted {
                    provider_claim_id,
                    message,
                    raw_response,
                }) => {
                    info!(%provider, attempt, %provider_claim_id, "Insurer accepted claim");
                    return ProviderResponse::accepted(provider, provider_claim_id, message, raw_response, attempt);
                }
                Ok(InsurerDecision::Rejected { reason, raw_response }) => {
                    info!(%provider, attempt, %reason, "Insurer rejected claim");
                    return ProviderResponse::rejected(provider, reason, raw_response, attempt);
                }
                Err(error) => error,
            };

            if !error.is_transient() {
                warn!(%provider, attempt, %error, "Insurer call failed permanently");
                return ProviderResponse::transport_failure(provider, error.to_string(), attempt);
            }

            if !self.policy.allows_retry_after(attempt) {
                warn!(%provider, attempt, %error, "Insurer retries exhausted");
                return ProviderResponse::transport_failure(provider, error.to_string(), attempt);
            }

            let backoff = self.policy.backoff_for(attempt);
            warn!(%provider, attempt, %error, backoff_ms = backoff.as_millis() as u64, "Insurer call failed, retrying");
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }
        }
    }

    /// One call under a semaphore permit and the per-call deadline
    async fn attempt(&self, client: &dyn InsurerClient, payload: &ClaimPayload) -> Result<InsurerDecision, PortError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PortError::internal("dispatch worker pool closed"))?;

        match tokio::time::timeout(self.policy.per_call_timeout, client.submit_claim(payload)).await {
            Ok(result) => result,
            Err(_) => Err(PortError::timeout(
                format!("submit_claim to {}", client.provider()),
                self.policy.per_call_timeout,
            )),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("policy", &self.policy)
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}
