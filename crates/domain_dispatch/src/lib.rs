//! Multi-Insurer Dispatch
//!
//! Fans a created CID submission out to every insurer named by the two drivers,
//! collects their heterogeneous answers and writes them back to the
//! [`domain_cid::SubmissionStore`], where the status aggregator finalizes the claim.
//!
//! # Components
//!
//! - [`InsurerClient`]: uniform contract every insurer adapter implements
//! - [`adapters`]: simulated insurers and the HTTP client
//! - [`InsurerRegistry`]: adapter lookup by [`domain_cid::InsuranceCompany`]
//! - [`RetryPolicy`]: attempts, exponential backoff and per-call deadline
//! - [`Dispatcher`]: concurrent fan-out bounded by a process-wide semaphore
//! - [`CidService`]: upload, intake with deduplication, and the query path

pub mod insurer;
pub mod adapters;
pub mod registry;
pub mod policy;
pub mod dispatcher;
pub mod service;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use insurer::{ClaimPayload, InsurerClient, InsurerDecision};
pub use adapters::{AllianzAdapter, GenericInsurerAdapter, HttpInsurerClient, HttpInsurerConfig, UnipolSaiAdapter};
pub use registry::InsurerRegistry;
pub use policy::RetryPolicy;
pub use dispatcher::{Dispatcher, DEFAULT_MAX_IN_FLIGHT};
pub use service::{CidService, SubmitCid, SubmitOutcome, UploadedDocument};
