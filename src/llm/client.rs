use crate::types::Result;
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction.
///
/// Both collaborators in the pipeline (planning and narrative synthesis) go
/// through this trait, so providers can be swapped without touching the
/// pipeline code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with a system prompt.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name/identifier.
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection.
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including compatible API endpoints).
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Ollama local LLM provider.
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Create a client instance for this provider.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            ))),

            Provider::Ollama { base_url, model } => Ok(Box::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone()).await?,
            )),
        }
    }

    /// Same provider endpoint, different model. Used to run planning and
    /// reporting on differently-sized models.
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            Provider::OpenAI {
                api_key, api_base, ..
            } => Provider::OpenAI {
                api_key: api_key.clone(),
                api_base: api_base.clone(),
                model: model.to_string(),
            },
            Provider::Ollama { base_url, .. } => Provider::Ollama {
                base_url: base_url.clone(),
                model: model.to_string(),
            },
        }
    }

    /// Get a human-readable name for this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }
}
