//! Property-Based Test Generators
//!
//! Proptest strategies producing valid declarations, documents and insurer
//! outcomes.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::Value;

use domain_cid::{AccidentDetails, CidData, InsuranceCompany, PersonInfo, ProviderResponse};

/// Strategy for generating supported insurers
pub fn insurance_company_strategy() -> impl Strategy<Value = InsuranceCompany> {
    prop_oneof![
        Just(InsuranceCompany::Allianz),
        Just(InsuranceCompany::UnipolSai),
        Just(InsuranceCompany::Generali),
        Just(InsuranceCompany::Axa),
    ]
}

/// Strategy for generating non-blank names
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,15}"
}

/// Strategy for generating Italian-style plates
pub fn license_plate_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{2}[0-9]{3}[A-Z]{2}"
}

/// Strategy for generating policy numbers
pub fn policy_number_strategy() -> impl Strategy<Value = String> {
    "POL-[0-9]{4,10}"
}

/// Strategy for generating timestamps in 2024
pub fn timestamp_2024_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..365 * 24 * 3600).prop_map(|offset| {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now);
        start + chrono::Duration::seconds(offset)
    })
}

/// Strategy for generating valid drivers
pub fn person_strategy() -> impl Strategy<Value = PersonInfo> {
    (
        name_strategy(),
        name_strategy(),
        license_plate_strategy(),
        insurance_company_strategy(),
        policy_number_strategy(),
    )
        .prop_map(|(name, surname, license_plate, insurance_company, policy_number)| PersonInfo {
            name,
            surname,
            license_plate,
            insurance_company,
            policy_number,
        })
}

/// Strategy for generating valid accident details
pub fn accident_strategy() -> impl Strategy<Value = AccidentDetails> {
    (
        timestamp_2024_strategy(),
        "[A-Za-z ]{3,60}",
        "[A-Za-z ,.]{5,200}",
        prop::collection::vec("[a-z_]{3,20}", 1..5),
        "[A-Za-z ]{3,100}",
    )
        .prop_map(|(timestamp, location, description, circumstances, damage_description)| {
            AccidentDetails {
                timestamp,
                location: format!("Via {location}"),
                description: format!("Impact: {description}"),
                circumstances,
                damage_description: format!("Damage: {damage_description}"),
            }
        })
}

/// Strategy for generating valid declarations
pub fn cid_data_strategy() -> impl Strategy<Value = CidData> {
    (person_strategy(), person_strategy(), accident_strategy()).prop_map(
        |(person_a, person_b, accident_details)| CidData {
            person_a,
            person_b,
            accident_details,
        },
    )
}

/// Strategy for generating non-empty document bytes
pub fn document_bytes_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..4096)
}

/// Strategy for generating one insurer outcome of any kind
pub fn provider_response_strategy(provider: InsuranceCompany) -> impl Strategy<Value = ProviderResponse> {
    prop_oneof![
        "[A-Z0-9]{4,8}".prop_map(move |id| ProviderResponse::accepted(
            provider,
            format!("{}-{id}", provider.as_str().to_uppercase()),
            "accepted",
            Value::Null,
            1
        )),
        "[a-z ]{3,20}".prop_map(move |reason| ProviderResponse::rejected(provider, reason, Value::Null, 1)),
        (1u32..5).prop_map(move |attempts| ProviderResponse::transport_failure(provider, "timed out", attempts)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_cid::{CidStatus, CidValidator};

    proptest! {
        #[test]
        fn generated_declarations_are_valid(data in cid_data_strategy()) {
            let result = CidValidator::validate(&data);
            prop_assert!(result.is_valid, "{:?}", result.errors);
        }

        #[test]
        fn insurers_are_distinct(data in cid_data_strategy()) {
            let insurers = data.insurers();
            prop_assert!(!insurers.is_empty() && insurers.len() <= 2);
            prop_assert_eq!(insurers[0], data.person_a.insurance_company);
            if insurers.len() == 2 {
                prop_assert_ne!(insurers[0], insurers[1]);
            }
        }

        #[test]
        fn aggregation_ignores_arrival_order(
            a in provider_response_strategy(InsuranceCompany::Allianz),
            b in provider_response_strategy(InsuranceCompany::Generali),
        ) {
            let expected = [InsuranceCompany::Allianz, InsuranceCompany::Generali];
            let forward = CidStatus::aggregate(&expected, &[a.clone(), b.clone()]);
            let backward = CidStatus::aggregate(&expected, &[b, a]);
            prop_assert_eq!(forward, backward);
            prop_assert!(forward.is_terminal());
        }

        #[test]
        fn any_rejection_wins(
            a in provider_response_strategy(InsuranceCompany::Axa),
            reason in "[a-z]{3,10}",
        ) {
            let rejection = ProviderResponse::rejected(InsuranceCompany::UnipolSai, reason, Value::Null, 1);
            let expected = [InsuranceCompany::Axa, InsuranceCompany::UnipolSai];
            prop_assert_eq!(CidStatus::aggregate(&expected, &[a, rejection]), CidStatus::Rejected);
        }
    }
}
