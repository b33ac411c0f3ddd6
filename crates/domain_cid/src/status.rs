//! Submission status and the aggregation rules that derive it

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::CoreError;

use crate::person::InsuranceCompany;
use crate::submission::ProviderResponse;

/// Overall status of a CID submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CidStatus {
    /// Record created, dispatch not started
    Pending,
    /// Dispatch started, outcome not final
    Submitted,
    /// Every expected insurer accepted the claim
    Approved,
    /// At least one insurer explicitly declined the claim
    Rejected,
    /// At least one insurer never gave a definitive answer
    Error,
}

impl CidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CidStatus::Pending => "pending",
            CidStatus::Submitted => "submitted",
            CidStatus::Approved => "approved",
            CidStatus::Rejected => "rejected",
            CidStatus::Error => "error",
        }
    }

    /// Terminal states never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, CidStatus::Approved | CidStatus::Rejected | CidStatus::Error)
    }

    /// Checks if moving to `target` respects the state machine
    ///
    /// Staying in `submitted` is allowed; nothing returns to `pending` and nothing
    /// leaves a terminal state.
    pub fn can_transition_to(&self, target: CidStatus) -> bool {
        use CidStatus::*;
        matches!(
            (*self, target),
            (Pending, Submitted) |
            (Pending, Approved) |
            (Pending, Rejected) |
            (Pending, Error) |
            (Submitted, Submitted) |
            (Submitted, Approved) |
            (Submitted, Rejected) |
            (Submitted, Error)
        )
    }

    /// Reduces per-insurer outcomes into one status
    ///
    /// Rules, in priority order:
    /// 1. any business rejection -> `rejected`, even with insurers still outstanding
    /// 2. an expected insurer has no outcome yet -> `submitted`
    /// 3. every expected insurer succeeded -> `approved`
    /// 4. otherwise at least one insurer exhausted its retries -> `error`
    ///
    /// Responses from insurers outside `expected` are ignored.
    pub fn aggregate(expected: &[InsuranceCompany], responses: &[ProviderResponse]) -> CidStatus {
        let relevant: Vec<&ProviderResponse> = responses
            .iter()
            .filter(|r| expected.contains(&r.provider))
            .collect();

        if relevant.iter().any(|r| r.is_rejection()) {
            return CidStatus::Rejected;
        }

        let answered = expected
            .iter()
            .filter(|provider| relevant.iter().any(|r| r.provider == **provider))
            .count();
        if answered < expected.len() {
            return CidStatus::Submitted;
        }

        if relevant.iter().all(|r| r.success) {
            CidStatus::Approved
        } else {
            CidStatus::Error
        }
    }
}

impl fmt::Display for CidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CidStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CidStatus::Pending),
            "submitted" => Ok(CidStatus::Submitted),
            "approved" => Ok(CidStatus::Approved),
            "rejected" => Ok(CidStatus::Rejected),
            "error" => Ok(CidStatus::Error),
            other => Err(CoreError::validation(format!("unknown CID status: {other}"))),
        }
    }
}
