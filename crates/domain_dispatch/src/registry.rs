//! Insurer client registry

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use core_kernel::PortError;
use domain_cid::InsuranceCompany;

use crate::adapters::{
    AllianzAdapter, GenericInsurerAdapter, HttpInsurerClient, HttpInsurerConfig, UnipolSaiAdapter,
};
use crate::insurer::InsurerClient;

/// Insurer clients keyed by company
#[derive(Clone, Default)]
pub struct InsurerRegistry {
    clients: HashMap<InsuranceCompany, Arc<dyn InsurerClient>>,
}

impl InsurerRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry backed by the simulated adapters for every supported insurer
    pub fn simulated(latency: Duration) -> Self {
        let mut registry = Self::new();
        for provider in InsuranceCompany::ALL {
            let client: Arc<dyn InsurerClient> = match provider {
                InsuranceCompany::Allianz => Arc::new(AllianzAdapter::new(latency)),
                InsuranceCompany::UnipolSai => Arc::new(UnipolSaiAdapter::new(latency)),
                other => Arc::new(GenericInsurerAdapter::new(other, latency)),
            };
            registry.insert(client);
        }
        registry
    }

    /// Registry posting every insurer's claims over HTTP
    ///
    /// All clients share one connection pool.
    pub fn http(config: &HttpInsurerConfig) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PortError::internal(format!("failed to build HTTP client: {e}")))?;

        let mut registry = Self::new();
        for provider in InsuranceCompany::ALL {
            registry.insert(Arc::new(HttpInsurerClient::with_client(provider, client.clone(), config)));
        }
        Ok(registry)
    }

    /// Adds or replaces the client for its provider
    pub fn register(mut self, client: Arc<dyn InsurerClient>) -> Self {
        self.insert(client);
        self
    }

    pub fn insert(&mut self, client: Arc<dyn InsurerClient>) {
        self.clients.insert(client.provider(), client);
    }

    pub fn get(&self, provider: InsuranceCompany) -> Option<Arc<dyn InsurerClient>> {
        self.clients.get(&provider).cloned()
    }

    /// Registered providers in declaration order
    pub fn providers(&self) -> Vec<InsuranceCompany> {
        InsuranceCompany::ALL
            .into_iter()
            .filter(|p| self.clients.contains_key(p))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl std::fmt::Debug for InsurerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsurerRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_registry_covers_all_insurers() {
        let registry = InsurerRegistry::simulated(Duration::ZERO);
        assert_eq!(registry.providers(), InsuranceCompany::ALL.to_vec());
        assert_eq!(
            registry.get(InsuranceCompany::Axa).map(|c| c.provider()),
            Some(InsuranceCompany::Axa)
        );
    }

    #[test]
    fn test_register_replaces_by_provider() {
        let registry = InsurerRegistry::new()
            .register(Arc::new(AllianzAdapter::default()))
            .register(Arc::new(AllianzAdapter::new(Duration::from_millis(5))));

        assert_eq!(registry.len(), 1);
        assert!(registry.get(InsuranceCompany::Generali).is_none());
    }

    #[test]
    fn test_http_registry_builds() {
        let registry = InsurerRegistry::http(&HttpInsurerConfig::new("http://localhost:8001/mock/insurance")).unwrap();
        assert_eq!(registry.len(), InsuranceCompany::ALL.len());
    }
}
