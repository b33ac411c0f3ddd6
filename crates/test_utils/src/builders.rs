//! Test Data Builders
//!
//! Builder patterns for declarations, intake requests and fully wired services.
//! Tests specify only the relevant fields and keep defaults for the rest.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use std::sync::Arc;
use std::time::Duration;

use core_kernel::ContentHash;
use domain_cid::{AccidentDetails, CidData, InMemorySubmissionStore, InsuranceCompany, PersonInfo};
use domain_dispatch::mock::ScriptedInsurer;
use domain_dispatch::{CidService, Dispatcher, InsurerRegistry, RetryPolicy, SubmitCid};

use crate::fixtures::{AccidentFixtures, CidFixtures, PersonFixtures};

/// Builder for drivers
pub struct PersonInfoBuilder {
    person: PersonInfo,
}

impl PersonInfoBuilder {
    /// Starts from the fixture driver of the given insurer
    pub fn insured_with(company: InsuranceCompany) -> Self {
        Self {
            person: PersonFixtures::insured_with(company),
        }
    }

    /// Random plausible driver of the given insurer
    pub fn random(company: InsuranceCompany) -> Self {
        let mut person = PersonFixtures::insured_with(company);
        person.name = FirstName().fake();
        person.surname = LastName().fake();
        Self { person }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.person.name = name.into();
        self
    }

    pub fn with_surname(mut self, surname: impl Into<String>) -> Self {
        self.person.surname = surname.into();
        self
    }

    pub fn with_license_plate(mut self, plate: impl Into<String>) -> Self {
        self.person.license_plate = plate.into();
        self
    }

    pub fn with_policy_number(mut self, policy: impl Into<String>) -> Self {
        self.person.policy_number = policy.into();
        self
    }

    pub fn build(self) -> PersonInfo {
        self.person
    }
}

/// Builder for declarations
pub struct CidDataBuilder {
    person_a: PersonInfo,
    person_b: PersonInfo,
    accident: AccidentDetails,
}

impl Default for CidDataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CidDataBuilder {
    /// Allianz driver vs Generali driver, rear collision
    pub fn new() -> Self {
        let data = CidFixtures::allianz_generali();
        Self {
            person_a: data.person_a,
            person_b: data.person_b,
            accident: data.accident_details,
        }
    }

    pub fn between(a: InsuranceCompany, b: InsuranceCompany) -> Self {
        let data = CidFixtures::between(a, b);
        Self {
            person_a: data.person_a,
            person_b: data.person_b,
            accident: data.accident_details,
        }
    }

    pub fn with_person_a(mut self, person: PersonInfo) -> Self {
        self.person_a = person;
        self
    }

    pub fn with_person_b(mut self, person: PersonInfo) -> Self {
        self.person_b = person;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.accident.location = location.into();
        self
    }

    pub fn with_circumstances(mut self, circumstances: Vec<&str>) -> Self {
        self.accident.circumstances = circumstances.into_iter().map(str::to_string).collect();
        self
    }

    pub fn with_accident(mut self, accident: AccidentDetails) -> Self {
        self.accident = accident;
        self
    }

    pub fn build(self) -> CidData {
        CidData {
            person_a: self.person_a,
            person_b: self.person_b,
            accident_details: self.accident,
        }
    }
}

/// Builder for intake requests
pub struct SubmitCidBuilder {
    cid_data: CidData,
    document: Vec<u8>,
    declared_hash: Option<String>,
    omit_hash: bool,
}

impl SubmitCidBuilder {
    /// Request for the given declaration and document, declaring the correct hash
    pub fn new(cid_data: CidData, document: Vec<u8>) -> Self {
        Self {
            cid_data,
            document,
            declared_hash: None,
            omit_hash: false,
        }
    }

    /// Declares a hash other than the document's
    pub fn with_declared_hash(mut self, hash: impl Into<String>) -> Self {
        self.declared_hash = Some(hash.into());
        self
    }

    /// Leaves the hash to the server
    pub fn without_hash(mut self) -> Self {
        self.omit_hash = true;
        self
    }

    pub fn build(self) -> SubmitCid {
        let pdf_hash = if self.omit_hash {
            None
        } else {
            Some(
                self.declared_hash
                    .unwrap_or_else(|| ContentHash::of(&self.document).to_string()),
            )
        };

        SubmitCid {
            cid_data: self.cid_data,
            pdf_base64: STANDARD.encode(&self.document),
            pdf_hash,
        }
    }
}

/// Builds a [`CidService`] over an in-memory store and scripted insurers
pub struct TestServiceBuilder {
    registry: InsurerRegistry,
    policy: RetryPolicy,
    max_in_flight: usize,
}

impl Default for TestServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestServiceBuilder {
    /// No insurers registered, three attempts, no backoff, 100ms deadline
    pub fn new() -> Self {
        Self {
            registry: InsurerRegistry::new(),
            policy: RetryPolicy::new(3, Duration::ZERO, Duration::from_millis(100)),
            max_in_flight: 8,
        }
    }

    /// Every insurer simulated, answering immediately
    pub fn simulated() -> Self {
        Self {
            registry: InsurerRegistry::simulated(Duration::ZERO),
            ..Self::new()
        }
    }

    pub fn with_insurer(mut self, insurer: Arc<ScriptedInsurer>) -> Self {
        self.registry.insert(insurer);
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Returns the service and a handle on its store
    pub fn build(self) -> (CidService, Arc<InMemorySubmissionStore>) {
        let store = Arc::new(InMemorySubmissionStore::new());
        let dispatcher = Dispatcher::new(store.clone(), Arc::new(self.registry), self.policy)
            .with_max_in_flight(self.max_in_flight);
        (CidService::new(store.clone(), dispatcher), store)
    }
}
