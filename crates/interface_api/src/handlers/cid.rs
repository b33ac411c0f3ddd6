//! CID handlers

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    Json,
};
use tracing::info;

use crate::dto::cid::*;
use crate::{error::ApiError, AppState};

/// Multipart field carrying the PDF
const FILE_FIELD: &str = "file";

/// Accepts a signed PDF and returns its hash and base64 form
pub async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadPdfResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("document.pdf").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        let uploaded = state
            .service
            .upload(&filename, content_type.as_deref(), &bytes)
            .await?;
        return Ok(Json(uploaded.into()));
    }

    Err(ApiError::Validation(vec![format!("{FILE_FIELD}: field is required")]))
}

/// Validates, stores and dispatches a declaration
pub async fn submit_cid(
    State(state): State<AppState>,
    payload: Result<Json<SubmitCidRequest>, JsonRejection>,
) -> Result<Json<SubmitCidResponse>, ApiError> {
    let Json(request) = payload?;
    let outcome = state.service.submit(request.into()).await?;

    info!(
        claim_id = %outcome.submission.claim_id,
        status = %outcome.submission.status,
        duplicate = outcome.duplicate,
        "CID submission handled"
    );
    Ok(Json(outcome.into()))
}

/// Gets a submission by claim id
pub async fn get_cid(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
) -> Result<Json<CidRecordResponse>, ApiError> {
    let submission = state.service.find(&claim_id).await?;
    Ok(Json(submission.into()))
}

/// Lists submissions, newest first
pub async fn list_cids(State(state): State<AppState>) -> Result<Json<Vec<CidRecordResponse>>, ApiError> {
    let submissions = state.service.list().await?;
    Ok(Json(submissions.into_iter().map(Into::into).collect()))
}
