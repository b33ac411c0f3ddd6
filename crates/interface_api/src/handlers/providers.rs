//! Insurer catalogue

use axum::{extract::State, Json};

use domain_cid::InsuranceCompany;

use crate::dto::cid::{ProviderInfo, ProvidersResponse};
use crate::AppState;

/// Lists supported insurers and whether each one can be dispatched to
pub async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    let registered = state.service.providers();
    let providers: Vec<ProviderInfo> = InsuranceCompany::ALL
        .into_iter()
        .map(|id| ProviderInfo {
            id,
            name: id.display_name(),
            enabled: registered.contains(&id),
        })
        .collect();

    Json(ProvidersResponse {
        total_providers: providers.len(),
        providers,
    })
}
