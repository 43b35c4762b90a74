//! General web search via the daedra crate (DuckDuckGo backend).

use crate::providers::registry::CapabilityProvider;
use crate::types::{AppError, Capability, ProviderPayload, Result, SearchHit};
use async_trait::async_trait;

/// Web search provider for the general-search capability.
pub struct WebSearchProvider {
    max_results: usize,
}

impl WebSearchProvider {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }
}

impl Default for WebSearchProvider {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl CapabilityProvider for WebSearchProvider {
    fn capability(&self) -> Capability {
        Capability::GeneralSearch
    }

    fn name(&self) -> &str {
        "web_search"
    }

    async fn execute(&self, input: &str) -> Result<ProviderPayload> {
        if input.trim().is_empty() {
            return Err(AppError::InvalidInput("empty search query".to_string()));
        }

        let search_args = daedra::SearchArgs {
            query: input.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: self.max_results,
                ..Default::default()
            }),
        };

        match daedra::tools::search::perform_search(&search_args).await {
            Ok(response) => {
                let hits: Vec<SearchHit> = response
                    .data
                    .iter()
                    .map(|r| SearchHit {
                        title: r.title.clone(),
                        url: r.url.clone(),
                        snippet: r.description.clone(),
                    })
                    .collect();

                tracing::debug!(query = input, count = hits.len(), "web search completed");
                Ok(ProviderPayload::SearchHits(hits))
            }
            Err(e) => Err(AppError::Provider(format!("Search failed: {}", e))),
        }
    }
}
