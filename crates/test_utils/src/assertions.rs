//! Custom Test Assertions
//!
//! Assertion helpers for submissions that give more meaningful failure
//! messages than plain `assert_eq!` on the whole record.

use domain_cid::{CidStatus, CidSubmission, InsuranceCompany};

/// Asserts the overall status of a submission
pub fn assert_status(submission: &CidSubmission, expected: CidStatus) {
    assert_eq!(
        submission.status, expected,
        "Claim {} has status {}, expected {} (responses: {:?})",
        submission.claim_id,
        submission.status,
        expected,
        submission
            .provider_responses
            .iter()
            .map(|r| (r.provider, r.success, r.error_detail.as_deref()))
            .collect::<Vec<_>>()
    );
}

/// Asserts the recorded outcomes as `(provider, success, provider claim id)` triples
pub fn assert_responses(submission: &CidSubmission, expected: &[(InsuranceCompany, bool, Option<&str>)]) {
    let actual: Vec<_> = submission
        .provider_responses
        .iter()
        .map(|r| (r.provider, r.success, r.provider_claim_id.as_deref()))
        .collect();

    assert_eq!(
        actual, expected,
        "Unexpected provider responses for claim {}",
        submission.claim_id
    );
}

/// Asserts that responses follow the expected-provider order without duplicates
pub fn assert_responses_in_expected_order(submission: &CidSubmission) {
    let positions: Vec<usize> = submission
        .provider_responses
        .iter()
        .map(|r| {
            submission
                .expected_providers
                .iter()
                .position(|p| *p == r.provider)
                .unwrap_or_else(|| panic!("Unexpected response from {}", r.provider))
        })
        .collect();

    assert!(
        positions.windows(2).all(|w| w[0] < w[1]),
        "Responses out of order for claim {}: {:?}",
        submission.claim_id,
        positions
    );
}

/// Asserts the `CID-` + 32 uppercase hex claim id format
pub fn assert_claim_id_format(claim_id: &str) {
    let hex = claim_id
        .strip_prefix("CID-")
        .unwrap_or_else(|| panic!("Claim id {claim_id} lacks the CID- prefix"));
    assert_eq!(hex.len(), 32, "Claim id {claim_id} has wrong length");
    assert!(
        hex.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()),
        "Claim id {claim_id} is not uppercase hex"
    );
}
