//! Stand-in insurer endpoint
//!
//! Answers like a real insurer API so that `http` insurer mode can be run
//! against this server during local development.

use axum::{extract::Path, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use domain_cid::InsuranceCompany;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct MockAcknowledgement {
    pub success: bool,
    pub claim_id: String,
    pub status: &'static str,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub processing_time: &'static str,
}

/// Acknowledges any claim sent to a known insurer
pub async fn submit_claim(
    Path(provider): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<MockAcknowledgement>, ApiError> {
    let provider: InsuranceCompany = provider
        .parse()
        .map_err(|_| ApiError::NotFound(format!("Unknown insurer '{provider}'")))?;

    let reference = Uuid::new_v4().simple().to_string();
    let claim_id = format!("{}-{}", provider.as_str().to_uppercase(), &reference[..8]);
    info!(
        %provider,
        %claim_id,
        cid = payload.get("claim_id").and_then(serde_json::Value::as_str).unwrap_or("unknown"),
        "Mock insurer received claim"
    );

    Ok(Json(MockAcknowledgement {
        success: true,
        claim_id,
        status: "received",
        message: format!("Mock response from {provider}"),
        timestamp: Utc::now(),
        processing_time: "2-5 business days",
    }))
}
