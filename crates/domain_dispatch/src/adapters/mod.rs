//! Insurer adapters
//!
//! - [`AllianzAdapter`] and [`UnipolSaiAdapter`]: simulated insurers shaping
//!   their provider-specific payloads and acknowledgements
//! - [`GenericInsurerAdapter`]: simulated insurer for everyone else
//! - [`HttpInsurerClient`]: posts the normalized payload to a JSON endpoint

pub mod allianz;
pub mod unipolsai;
pub mod generic;
pub mod http;

pub use allianz::AllianzAdapter;
pub use unipolsai::UnipolSaiAdapter;
pub use generic::GenericInsurerAdapter;
pub use http::{HttpInsurerClient, HttpInsurerConfig};

use std::time::Duration;

/// Eight hex characters used in simulated insurer references
pub(crate) fn short_reference() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Waits out the configured simulated latency
pub(crate) async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}
