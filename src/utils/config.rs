//! Environment-driven configuration.
//!
//! Every knob has a default except the LLM credentials, which decide which
//! provider backs the planning and synthesis collaborators.

use crate::types::{AppError, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LLMConfig,
    pub search: SearchConfig,
    pub executor: ExecutorConfig,
    pub fusion: FusionConfig,
    pub report: ReportConfig,
    pub github_token: Option<String>,
    /// `li_at` session cookie for authenticated profile pages.
    pub linkedin_cookie: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub openai_api_key: Option<String>,
    pub openai_api_base: Option<String>,
    pub openai_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    /// Optional smaller model for the planning pass; synthesis stays on the
    /// main model.
    pub planner_model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub max_results: usize,
}

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub max_tasks: usize,
    pub max_retries: u32,
    pub retry_pause: Duration,
    pub session_deadline: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct FusionConfig {
    pub min_confidence: f32,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub output_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            llm: LLMConfig {
                openai_api_key: env::var("OPENAI_API_KEY").ok(),
                openai_api_base: env::var("OPENAI_API_BASE").ok(),
                openai_model: env::var("OPENAI_MODEL")
                    .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                ollama_url: env::var("OLLAMA_URL")
                    .unwrap_or_else(|_| "http://localhost:11434".to_string()),
                ollama_model: env::var("OLLAMA_MODEL")
                    .unwrap_or_else(|_| "llama3.1".to_string()),
                planner_model: env::var("DOSSIER_PLANNER_MODEL").ok(),
            },
            search: SearchConfig {
                max_results: parse_var("DOSSIER_SEARCH_RESULTS", 5)?,
            },
            executor: ExecutorConfig {
                max_tasks: parse_var("DOSSIER_MAX_TASKS", 8)?,
                max_retries: parse_var("DOSSIER_MAX_RETRIES", 1)?,
                retry_pause: Duration::from_secs(parse_var("DOSSIER_RETRY_PAUSE_SECS", 2)?),
                session_deadline: optional_var("DOSSIER_SESSION_DEADLINE_SECS")?
                    .map(Duration::from_secs),
            },
            fusion: FusionConfig {
                min_confidence: parse_var("DOSSIER_MIN_CONFIDENCE", 0.0)?,
            },
            report: ReportConfig {
                output_dir: env::var("DOSSIER_OUTPUT_DIR").unwrap_or_else(|_| ".".to_string()),
            },
            github_token: env::var("GITHUB_TOKEN").ok(),
            linkedin_cookie: env::var("LINKEDIN_COOKIE").ok(),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an unparsable value: '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

fn optional_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} has an unparsable value: '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}
