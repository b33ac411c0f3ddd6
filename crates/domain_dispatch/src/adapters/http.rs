//! HTTP insurer client
//!
//! Posts the normalized [`ClaimPayload`] as JSON to `{base_url}/{provider}/submit`
//! and maps the answer onto the dispatch contract:
//!
//! - 2xx `{"success": true, "claim_id": ...}` -> accepted
//! - 2xx `{"success": false}`, 409, 422 -> rejected (definitive, not retried)
//! - 408, 429, 5xx, connect errors, timeouts -> transient `PortError`
//! - 401/403 -> `PortError::Unauthorized`
//! - anything else -> `PortError::Validation`

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use core_kernel::{DomainPort, PortError};
use domain_cid::InsuranceCompany;

use crate::insurer::{ClaimPayload, InsurerClient, InsurerDecision};

/// Retry-After fallback when a 429 carries no usable header
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Configuration for the HTTP insurer client
#[derive(Debug, Clone)]
pub struct HttpInsurerConfig {
    /// Base URL; the provider name and `/submit` are appended
    pub base_url: String,
    /// Transport-level timeout for one request
    pub request_timeout: Duration,
}

impl HttpInsurerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Acknowledgement body returned by insurer endpoints
#[derive(Debug, Deserialize)]
struct Acknowledgement {
    success: bool,
    #[serde(default)]
    claim_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "reason")]
    error: Option<String>,
}

/// Insurer client speaking JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpInsurerClient {
    provider: InsuranceCompany,
    client: Client,
    endpoint: String,
    request_timeout: Duration,
}

impl HttpInsurerClient {
    /// Builds a client for one provider over a shared connection pool
    pub fn with_client(provider: InsuranceCompany, client: Client, config: &HttpInsurerConfig) -> Self {
        let endpoint = format!(
            "{}/{}/submit",
            config.base_url.trim_end_matches('/'),
            provider.as_str()
        );
        Self {
            provider,
            client,
            endpoint,
            request_timeout: config.request_timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_transport_error(&self, error: reqwest::Error) -> PortError {
        if error.is_timeout() {
            PortError::timeout(format!("POST {}", self.endpoint), self.request_timeout)
        } else {
            PortError::Connection {
                message: format!("{} unreachable: {error}", self.provider),
                source: Some(Box::new(error)),
            }
        }
    }

    fn map_status(&self, status: StatusCode, retry_after: Option<u64>, body: &str) -> PortError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized {
                message: format!("{} refused credentials ({status})", self.provider),
            },
            StatusCode::TOO_MANY_REQUESTS => PortError::RateLimited {
                retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            },
            StatusCode::REQUEST_TIMEOUT => {
                PortError::timeout(format!("POST {}", self.endpoint), self.request_timeout)
            }
            s if s.is_server_error() => PortError::ServiceUnavailable {
                service: format!("{} ({status})", self.provider),
            },
            _ => PortError::validation(format!("{} answered {status}: {body}", self.provider)),
        }
    }
}

impl DomainPort for HttpInsurerClient {}

#[async_trait]
impl InsurerClient for HttpInsurerClient {
    fn provider(&self) -> InsuranceCompany {
        self.provider
    }

    async fn submit_claim(&self, payload: &ClaimPayload) -> Result<InsurerDecision, PortError> {
        debug!(provider = %self.provider, endpoint = %self.endpoint, "POST claim");

        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.map_err(|e| self.map_transport_error(e))?;

        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            let raw_response = serde_json::from_str(&body).unwrap_or(Value::String(body.clone()));
            let reason = rejection_reason(&raw_response).unwrap_or_else(|| status.to_string());
            return Ok(InsurerDecision::Rejected { reason, raw_response });
        }

        if !status.is_success() {
            warn!(provider = %self.provider, %status, "Insurer call failed");
            return Err(self.map_status(status, retry_after, &body));
        }

        let raw_response: Value = serde_json::from_str(&body)
            .map_err(|e| PortError::validation(format!("{} sent malformed JSON: {e}", self.provider)))?;
        let ack: Acknowledgement = serde_json::from_value(raw_response.clone())
            .map_err(|e| PortError::validation(format!("{} sent an unexpected body: {e}", self.provider)))?;

        match ack {
            Acknowledgement { success: true, claim_id: Some(provider_claim_id), message, .. } => {
                Ok(InsurerDecision::Accepted {
                    message: message
                        .unwrap_or_else(|| format!("CID successfully submitted to {}", self.provider.display_name())),
                    provider_claim_id,
                    raw_response,
                })
            }
            Acknowledgement { success: true, claim_id: None, .. } => Err(PortError::validation(format!(
                "{} accepted the claim without a claim id",
                self.provider
            ))),
            Acknowledgement { success: false, error, message, .. } => Ok(InsurerDecision::Rejected {
                reason: error.or(message).unwrap_or_else(|| "rejected".to_string()),
                raw_response,
            }),
        }
    }
}

fn rejection_reason(body: &Value) -> Option<String> {
    ["error", "reason", "message"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
}
