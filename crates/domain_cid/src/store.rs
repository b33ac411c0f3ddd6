//! In-memory submission store

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use core_kernel::{
    AdapterHealth, ClaimId, ContentHash, DomainPort, HealthCheckResult, HealthCheckable,
};

use crate::error::CidError;
use crate::ports::SubmissionStore;
use crate::submission::{CidSubmission, ProviderResponse};

#[derive(Default)]
struct StoreState {
    submissions: HashMap<ClaimId, Arc<Mutex<CidSubmission>>>,
    by_hash: HashMap<ContentHash, ClaimId>,
    documents: HashMap<ContentHash, Vec<u8>>,
}

/// Submission store kept in process memory
///
/// The outer lock guards the indexes only; each record has its own mutex so
/// recordings for different claims never contend.
#[derive(Default)]
pub struct InMemorySubmissionStore {
    state: RwLock<StoreState>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored submissions
    pub async fn len(&self) -> usize {
        self.state.read().await.submissions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn record(&self, claim_id: ClaimId) -> Result<Arc<Mutex<CidSubmission>>, CidError> {
        self.state
            .read()
            .await
            .submissions
            .get(&claim_id)
            .cloned()
            .ok_or_else(|| CidError::not_found(claim_id))
    }
}

impl DomainPort for InMemorySubmissionStore {}

#[async_trait]
impl HealthCheckable for InMemorySubmissionStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in-memory-submission-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("In-memory store, records are lost on restart".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    #[instrument(skip(self, submission, document), fields(claim_id = %submission.claim_id))]
    async fn create(&self, submission: CidSubmission, document: Vec<u8>) -> Result<CidSubmission, CidError> {
        let existing = {
            let mut state = self.state.write().await;

            let existing = state
                .by_hash
                .get(submission.content_hash())
                .and_then(|id| state.submissions.get(id))
                .cloned();

            match existing {
                Some(record) => record,
                None => {
                    if state.submissions.contains_key(&submission.claim_id) {
                        return Err(CidError::ClaimIdCollision(submission.claim_id));
                    }

                    let hash = submission.content_hash().clone();
                    state.documents.insert(hash.clone(), document);
                    state.by_hash.insert(hash, submission.claim_id);
                    state
                        .submissions
                        .insert(submission.claim_id, Arc::new(Mutex::new(submission.clone())));

                    info!(providers = ?submission.expected_providers, "Submission created");
                    return Ok(submission);
                }
            }
        };

        let existing = existing.lock().await.clone();
        debug!(existing = %existing.claim_id, "Document already submitted");
        Err(CidError::DuplicateDocument(Box::new(existing)))
    }

    #[instrument(skip(self))]
    async fn mark_submitted(&self, claim_id: ClaimId) -> Result<CidSubmission, CidError> {
        let record = self.record(claim_id).await?;
        let mut submission = record.lock().await;
        submission.mark_submitted()?;
        Ok(submission.clone())
    }

    #[instrument(skip(self, response), fields(provider = %response.provider, success = response.success))]
    async fn record_response(
        &self,
        claim_id: ClaimId,
        response: ProviderResponse,
    ) -> Result<CidSubmission, CidError> {
        let record = self.record(claim_id).await?;
        let mut submission = record.lock().await;
        submission.record_response(response)?;
        debug!(status = %submission.status, "Response recorded");
        Ok(submission.clone())
    }

    async fn get(&self, claim_id: ClaimId) -> Result<CidSubmission, CidError> {
        let record = self.record(claim_id).await?;
        let submission = record.lock().await.clone();
        Ok(submission)
    }

    async fn find_by_hash(&self, hash: &ContentHash) -> Result<Option<CidSubmission>, CidError> {
        let record = {
            let state = self.state.read().await;
            state
                .by_hash
                .get(hash)
                .and_then(|id| state.submissions.get(id))
                .cloned()
        };

        match record {
            Some(record) => Ok(Some(record.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<CidSubmission>, CidError> {
        let records: Vec<_> = self.state.read().await.submissions.values().cloned().collect();

        let mut submissions = Vec::with_capacity(records.len());
        for record in records {
            submissions.push(record.lock().await.clone());
        }
        submissions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.claim_id.cmp(&a.claim_id))
        });
        Ok(submissions)
    }

    async fn document(&self, hash: &ContentHash) -> Result<Vec<u8>, CidError> {
        self.state
            .read()
            .await
            .documents
            .get(hash)
            .cloned()
            .ok_or_else(|| CidError::DocumentNotFound(hash.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accident::AccidentDetails;
    use crate::person::{InsuranceCompany, PersonInfo};
    use crate::status::CidStatus;
    use crate::submission::{CidData, CidDocument};

    fn person(company: InsuranceCompany) -> PersonInfo {
        PersonInfo {
            name: "Marco".to_string(),
            surname: "Bianchi".to_string(),
            license_plate: "CD456EF".to_string(),
            insurance_company: company,
            policy_number: "POL-42".to_string(),
        }
    }

    fn submission(bytes: &[u8]) -> CidSubmission {
        let data = CidData {
            person_a: person(InsuranceCompany::Allianz),
            person_b: person(InsuranceCompany::Generali),
            accident_details: AccidentDetails {
                timestamp: Utc::now(),
                location: "Torino".to_string(),
                description: "Side impact".to_string(),
                circumstances: vec!["side_collision".to_string()],
                damage_description: "Door scratched".to_string(),
            },
        };
        CidSubmission::new(data, CidDocument::for_bytes(bytes))
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = InMemorySubmissionStore::new();
        let created = store.create(submission(b"doc-1"), b"doc-1".to_vec()).await.unwrap();

        let fetched = store.get(created.claim_id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(store.document(created.content_hash()).await.unwrap(), b"doc-1".to_vec());
    }

    #[tokio::test]
    async fn test_duplicate_document_returns_existing() {
        let store = InMemorySubmissionStore::new();
        let first = store.create(submission(b"same"), b"same".to_vec()).await.unwrap();

        match store.create(submission(b"same"), b"same".to_vec()).await {
            Err(CidError::DuplicateDocument(existing)) => assert_eq!(existing.claim_id, first.claim_id),
            other => panic!("expected duplicate, got {other:?}"),
        }
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_claim_id_collision() {
        let store = InMemorySubmissionStore::new();
        let first = store.create(submission(b"one"), b"one".to_vec()).await.unwrap();

        let mut second = submission(b"two");
        second.claim_id = first.claim_id;
        assert!(matches!(
            store.create(second, b"two".to_vec()).await,
            Err(CidError::ClaimIdCollision(id)) if id == first.claim_id
        ));
    }

    #[tokio::test]
    async fn test_record_response_rules() {
        let store = InMemorySubmissionStore::new();
        let created = store.create(submission(b"rules"), b"rules".to_vec()).await.unwrap();
        store.mark_submitted(created.claim_id).await.unwrap();

        let axa = ProviderResponse::accepted(InsuranceCompany::Axa, "AXA-1", "ok", serde_json::Value::Null, 1);
        assert!(matches!(
            store.record_response(created.claim_id, axa).await,
            Err(CidError::UnknownInsurer { .. })
        ));

        let ok = ProviderResponse::accepted(InsuranceCompany::Allianz, "ALZ-1", "ok", serde_json::Value::Null, 1);
        let updated = store.record_response(created.claim_id, ok.clone()).await.unwrap();
        assert_eq!(updated.status, CidStatus::Submitted);

        assert!(matches!(
            store.record_response(created.claim_id, ok).await,
            Err(CidError::DuplicateResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_claim_is_not_found() {
        let store = InMemorySubmissionStore::new();
        assert!(matches!(store.get(ClaimId::issue()).await, Err(CidError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = InMemorySubmissionStore::new();
        let older = store.create(submission(b"older"), b"older".to_vec()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let newer = store.create(submission(b"newer"), b"newer".to_vec()).await.unwrap();

        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|s| s.claim_id).collect();
        assert_eq!(ids, vec![newer.claim_id, older.claim_id]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_recordings_keep_one_outcome_per_insurer() {
        let store = Arc::new(InMemorySubmissionStore::new());
        let created = store.create(submission(b"race"), b"race".to_vec()).await.unwrap();
        store.mark_submitted(created.claim_id).await.unwrap();

        let mut tasks = Vec::new();
        for round in 0..8 {
            for provider in [InsuranceCompany::Generali, InsuranceCompany::Allianz] {
                let store = Arc::clone(&store);
                let claim_id = created.claim_id;
                tasks.push(tokio::spawn(async move {
                    let response = ProviderResponse::accepted(
                        provider,
                        format!("{provider}-{round}"),
                        "ok",
                        serde_json::Value::Null,
                        1,
                    );
                    store.record_response(claim_id, response).await
                }));
            }
        }

        let mut recorded = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => recorded += 1,
                Err(CidError::DuplicateResponse { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let record = store.get(created.claim_id).await.unwrap();
        assert_eq!(recorded, 2);
        let providers: Vec<_> = record.provider_responses.iter().map(|r| r.provider).collect();
        assert_eq!(providers, vec![InsuranceCompany::Allianz, InsuranceCompany::Generali]);
        assert_eq!(record.status, CidStatus::Approved);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_rejection_and_acceptance_end_rejected() {
        let store = Arc::new(InMemorySubmissionStore::new());
        let claim_id = store.create(submission(b"split"), b"split".to_vec()).await.unwrap().claim_id;
        store.mark_submitted(claim_id).await.unwrap();

        let accept = {
            let store = Arc::clone(&store);
            let response =
                ProviderResponse::accepted(InsuranceCompany::Allianz, "ALZ-1", "ok", serde_json::Value::Null, 1);
            tokio::spawn(async move { store.record_response(claim_id, response).await })
        };
        let reject = {
            let store = Arc::clone(&store);
            let response =
                ProviderResponse::rejected(InsuranceCompany::Generali, "policy lapsed", serde_json::Value::Null, 1);
            tokio::spawn(async move { store.record_response(claim_id, response).await })
        };
        accept.await.unwrap().unwrap();
        reject.await.unwrap().unwrap();

        let record = store.get(claim_id).await.unwrap();
        assert_eq!(record.status, CidStatus::Rejected);
        assert_eq!(record.provider_responses.len(), 2);
        assert_eq!(record.provider_responses[0].provider, InsuranceCompany::Allianz);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_of_same_document_keep_one() {
        let store = Arc::new(InMemorySubmissionStore::new());

        let tasks: Vec<_> = (0..6)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create(submission(b"twin"), b"twin".to_vec()).await })
            })
            .collect();

        let mut winners = Vec::new();
        let mut duplicates_of = Vec::new();
        for task in tasks {
            match task.await.unwrap() {
                Ok(created) => winners.push(created.claim_id),
                Err(CidError::DuplicateDocument(existing)) => duplicates_of.push(existing.claim_id),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(winners.len(), 1);
        assert!(duplicates_of.iter().all(|id| *id == winners[0]));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_waiting_duplicate_does_not_block_other_creates() {
        let store = Arc::new(InMemorySubmissionStore::new());
        let first = store.create(submission(b"busy"), b"busy".to_vec()).await.unwrap();
        let record = store.record(first.claim_id).await.unwrap();
        let held = record.lock().await;

        let duplicate = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.create(submission(b"busy"), b"busy".to_vec()).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let other = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            store.create(submission(b"unrelated"), b"unrelated".to_vec()),
        )
        .await;
        assert!(matches!(other, Ok(Ok(_))));

        drop(held);
        assert!(matches!(
            duplicate.await.unwrap(),
            Err(CidError::DuplicateDocument(existing)) if existing.claim_id == first.claim_id
        ));
    }
}
