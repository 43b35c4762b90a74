use crate::types::{Capability, CostModel, ProviderPayload, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Static descriptor advertised by every provider.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub name: String,
    pub cost_model: CostModel,
    pub timeout_budget: Duration,
}

/// Uniform interface over heterogeneous external capabilities.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// The capability this provider serves.
    fn capability(&self) -> Capability;

    /// Provider name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Execute one call against the external capability.
    async fn execute(&self, input: &str) -> Result<ProviderPayload>;

    /// Descriptor derived from the declared capability.
    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            name: self.name().to_string(),
            cost_model: self.capability().cost_model(),
            timeout_budget: self.capability().timeout_budget(),
        }
    }
}

/// Maps capabilities to their registered provider.
pub struct ProviderRegistry {
    providers: HashMap<Capability, Arc<dyn CapabilityProvider>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registry wired with the four production providers.
    pub fn with_default_providers(config: &crate::utils::config::Config) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::providers::search::WebSearchProvider::new(
            config.search.max_results,
        )));
        registry.register(Arc::new(crate::providers::academic::ArxivProvider::new(
            config.search.max_results,
        )));
        registry.register(Arc::new(crate::providers::github::GithubProvider::new(
            config.github_token.clone(),
        )));
        registry.register(Arc::new(crate::providers::linkedin::LinkedinProvider::new(
            config.linkedin_cookie.clone(),
        )));
        registry
    }

    pub fn register(&mut self, provider: Arc<dyn CapabilityProvider>) {
        self.providers.insert(provider.capability(), provider);
    }

    pub fn get(&self, capability: Capability) -> Option<Arc<dyn CapabilityProvider>> {
        self.providers.get(&capability).cloned()
    }

    pub fn has_provider(&self, capability: Capability) -> bool {
        self.providers.contains_key(&capability)
    }

    /// Descriptors for every registered provider, sorted by capability.
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        let mut caps: Vec<_> = self.providers.keys().copied().collect();
        caps.sort();
        caps.iter()
            .filter_map(|c| self.providers.get(c))
            .map(|p| p.descriptor())
            .collect()
    }
}
