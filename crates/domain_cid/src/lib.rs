//! CID (Constat Amiable / Constatazione Amichevole di Incidente) Domain
//!
//! This crate models an amicable accident declaration shared between two drivers
//! and their insurers, from intake through multi-insurer dispatch.
//!
//! # Submission Lifecycle
//!
//! ```text
//! pending -> submitted -> approved | rejected | error
//!        \____________________________^
//! ```
//!
//! A submission is created once per document hash, collects exactly one
//! [`ProviderResponse`] per insurer named by the two drivers, and its status is
//! re-derived by the aggregator after every recorded response.

pub mod person;
pub mod accident;
pub mod submission;
pub mod status;
pub mod validation;
pub mod ports;
pub mod store;
pub mod error;

pub use person::{PersonInfo, InsuranceCompany};
pub use accident::AccidentDetails;
pub use submission::{CidData, CidDocument, CidSubmission, ProviderResponse, FailureKind};
pub use status::CidStatus;
pub use validation::{CidValidator, ValidationResult};
pub use ports::SubmissionStore;
pub use store::InMemorySubmissionStore;
pub use error::CidError;
