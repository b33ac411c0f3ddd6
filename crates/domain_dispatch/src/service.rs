//! CID intake and query service
//!
//! Upload, submission with content-hash deduplication, dispatch, and the read
//! path over the submission store.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

use core_kernel::{ClaimId, ContentHash, HealthCheckResult, PortError};
use domain_cid::{
    CidData, CidDocument, CidError, CidSubmission, CidValidator, InsuranceCompany, SubmissionStore,
};

use crate::dispatcher::Dispatcher;

/// Content type accepted for signed declarations
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A received document, before any submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub filename: String,
    pub size: u64,
    pub hash: ContentHash,
    pub base64: String,
    pub content_type: String,
    /// Claim already filed for these exact bytes, if any
    pub existing_claim_id: Option<ClaimId>,
}

/// Intake request: the declaration plus the signed PDF
#[derive(Debug, Clone)]
pub struct SubmitCid {
    pub cid_data: CidData,
    pub pdf_base64: String,
    /// Hash declared by the client; the server recomputes it either way
    pub pdf_hash: Option<String>,
}

/// Result of an intake
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub submission: CidSubmission,
    /// True when these bytes had already been submitted
    pub duplicate: bool,
}

/// Application service over the store and the dispatcher
#[derive(Clone)]
pub struct CidService {
    store: Arc<dyn SubmissionStore>,
    dispatcher: Dispatcher,
}

impl CidService {
    pub fn new(store: Arc<dyn SubmissionStore>, dispatcher: Dispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Accepts a PDF, hashes it, and reports whether it was already filed
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<UploadedDocument, CidError> {
        let content_type = content_type.unwrap_or_default();
        if !is_pdf(content_type) {
            return Err(CidError::validation("Only PDF files are allowed"));
        }
        if bytes.is_empty() {
            return Err(CidError::validation("file: document is empty"));
        }

        let hash = ContentHash::of(bytes);
        let existing_claim_id = self.store.find_by_hash(&hash).await?.map(|s| s.claim_id);
        info!(%hash, existing = ?existing_claim_id, "Document uploaded");

        Ok(UploadedDocument {
            filename: filename.to_string(),
            size: bytes.len() as u64,
            base64: STANDARD.encode(bytes),
            hash,
            content_type: PDF_CONTENT_TYPE.to_string(),
            existing_claim_id,
        })
    }

    /// Validates, deduplicates, stores and dispatches a declaration
    ///
    /// Submitting bytes that are already on file returns the existing record
    /// with `duplicate` set. Nothing is dispatched again unless that record's
    /// dispatch never finished, in which case the missing insurers are called.
    ///
    /// Dispatch runs on its own task: a caller that goes away mid-dispatch does
    /// not stop outcomes from being recorded.
    #[instrument(skip(self, request))]
    pub async fn submit(&self, request: SubmitCid) -> Result<SubmitOutcome, CidError> {
        CidValidator::validate(&request.cid_data).into_result()?;

        let document = STANDARD
            .decode(request.pdf_base64.trim())
            .map_err(|e| CidError::validation(format!("pdf_base64: invalid base64 ({e})")))?;
        if document.is_empty() {
            return Err(CidError::validation("pdf_base64: document is empty"));
        }

        let hash = match request.pdf_hash.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
            Some(declared) => ContentHash::verify(declared, &document).ok_or_else(|| {
                let actual = ContentHash::of(&document);
                warn!(declared, %actual, "Declared document hash does not match");
                CidError::HashMismatch {
                    declared: declared.to_string(),
                    actual,
                }
            })?,
            None => ContentHash::of(&document),
        };

        if let Some(existing) = self.store.find_by_hash(&hash).await? {
            info!(claim_id = %existing.claim_id, "Duplicate submission");
            return self.resume_duplicate(existing).await;
        }

        let submission = CidSubmission::new(
            request.cid_data,
            CidDocument {
                content_hash: hash,
                size_bytes: document.len() as u64,
            },
        );

        let created = match self.store.create(submission, document).await {
            Ok(created) => created,
            Err(CidError::DuplicateDocument(existing)) => {
                info!(claim_id = %existing.claim_id, "Duplicate submission raced a concurrent intake");
                return self.resume_duplicate(*existing).await;
            }
            Err(e) => return Err(e),
        };
        info!(claim_id = %created.claim_id, "CID submission created");

        let submission = self.dispatch_detached(created.claim_id).await?;
        Ok(SubmitOutcome {
            submission,
            duplicate: false,
        })
    }

    async fn resume_duplicate(&self, existing: CidSubmission) -> Result<SubmitOutcome, CidError> {
        let submission = if !existing.is_terminal() || !existing.is_fully_populated() {
            info!(
                claim_id = %existing.claim_id,
                status = %existing.status,
                recorded = existing.provider_responses.len(),
                "Resuming unfinished dispatch"
            );
            self.dispatch_detached(existing.claim_id).await?
        } else {
            existing
        };

        Ok(SubmitOutcome {
            submission,
            duplicate: true,
        })
    }

    /// Dispatches on a spawned task and waits for it
    async fn dispatch_detached(&self, claim_id: ClaimId) -> Result<CidSubmission, CidError> {
        let dispatcher = self.dispatcher.clone();
        let task = tokio::spawn(async move { dispatcher.dispatch(claim_id).await }.in_current_span());

        task.await.map_err(|e| {
            CidError::Storage(PortError::internal(format!("dispatch task for {claim_id} failed: {e}")))
        })?
    }

    pub async fn get(&self, claim_id: ClaimId) -> Result<CidSubmission, CidError> {
        self.store.get(claim_id).await
    }

    /// Looks up a claim by its textual id; malformed ids are simply not found
    pub async fn find(&self, claim_ref: &str) -> Result<CidSubmission, CidError> {
        let claim_id = claim_ref
            .parse::<ClaimId>()
            .map_err(|_| CidError::not_found(claim_ref))?;
        self.get(claim_id).await
    }

    /// All submissions, newest first
    pub async fn list(&self) -> Result<Vec<CidSubmission>, CidError> {
        self.store.list().await
    }

    /// Insurers with a registered client
    pub fn providers(&self) -> Vec<InsuranceCompany> {
        self.dispatcher.registry().providers()
    }

    pub async fn readiness(&self) -> HealthCheckResult {
        self.store.health_check().await
    }
}

impl std::fmt::Debug for CidService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CidService")
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

fn is_pdf(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
}
