//! End-to-end research orchestration.
//!
//! One coordinator owns the whole pipeline: plan, route, execute, an
//! optional discovery round, fuse, synthesize, render. Pipeline-internal
//! failures degrade the report instead of failing the run; only setup
//! problems (bad config, no usable LLM endpoint) surface as errors.

use crate::executor::retry::RetryPolicy;
use crate::executor::Executor;
use crate::fusion::FusionEngine;
use crate::ledger::CostLedger;
use crate::llm::Provider;
use crate::planner::Planner;
use crate::providers::ProviderRegistry;
use crate::report::{render_report, save_report, Synthesizer};
use crate::router::Router;
use crate::types::{
    Capability, CostSummary, ProviderPayload, Result, RoutedTask, TaskDescriptor, TaskResult,
    TaskStatus, UnifiedProfile,
};
use crate::utils::config::Config;
use crate::utils::persona::Persona;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One research run's inputs.
#[derive(Debug, Clone)]
pub struct ResearchRequest {
    pub goal: String,
    pub persona: Persona,
    /// Pre-routed code-hosting handle; bypasses the router for that capability.
    pub github_override: Option<String>,
    /// Pre-routed profile URL; bypasses the router for that capability.
    pub linkedin_override: Option<String>,
}

impl ResearchRequest {
    pub fn new(goal: impl Into<String>, persona: Persona) -> Self {
        Self {
            goal: goal.into(),
            persona,
            github_override: None,
            linkedin_override: None,
        }
    }
}

/// Everything one run produced.
pub struct ResearchOutcome {
    pub report: String,
    pub profile: UnifiedProfile,
    pub costs: CostSummary,
    /// True when the fallback plan replaced collaborator output.
    pub degraded_plan: bool,
}

/// Drives a full research session over the assembled pipeline parts.
pub struct ResearchCoordinator {
    planner: Planner,
    synthesizer: Synthesizer,
    executor: Executor,
    fusion: FusionEngine,
    ledger: Arc<CostLedger>,
    retry: RetryPolicy,
    output_dir: PathBuf,
}

impl ResearchCoordinator {
    pub fn new(
        planner: Planner,
        synthesizer: Synthesizer,
        registry: Arc<ProviderRegistry>,
        config: &Config,
    ) -> Self {
        let mut executor = Executor::new(registry);
        if let Some(deadline) = config.executor.session_deadline {
            executor = executor.with_session_deadline(deadline);
        }

        Self {
            planner,
            synthesizer,
            executor,
            fusion: FusionEngine::new().with_min_confidence(config.fusion.min_confidence),
            ledger: Arc::new(CostLedger::new()),
            retry: RetryPolicy::new(config.executor.max_retries, config.executor.retry_pause),
            output_dir: PathBuf::from(&config.report.output_dir),
        }
    }

    /// Wire the coordinator from configuration alone: default providers plus
    /// LLM collaborators picked by available credentials.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let provider = select_llm_provider(config);
        tracing::info!(provider = provider.name(), "llm provider selected");

        let planner_llm = select_planner_provider(config, &provider)
            .create_client()
            .await?;
        let synthesis_llm = provider.create_client().await?;
        let registry = Arc::new(ProviderRegistry::with_default_providers(config));

        Ok(Self::new(
            Planner::new(planner_llm, config.executor.max_tasks),
            Synthesizer::new(synthesis_llm),
            registry,
            config,
        ))
    }

    pub fn ledger(&self) -> &Arc<CostLedger> {
        &self.ledger
    }

    /// Run the full pipeline and return the rendered report.
    pub async fn run(&self, request: &ResearchRequest) -> ResearchOutcome {
        self.ledger.reset();
        tracing::info!(
            goal = %request.goal,
            persona = request.persona.key,
            session = %self.ledger.session_id(),
            "research session started"
        );

        let plan = self.planner.plan(&request.goal, &request.persona).await;
        let router = Router::new(&request.goal);
        let tasks = assemble_tasks(&router, &plan.tasks, request);

        let mut results = self.execute_with_retry(&tasks).await;

        let followups = discovery_tasks(&router, &results, request);
        if !followups.is_empty() {
            tracing::info!(tasks = followups.len(), "discovery round scheduled");
            results.extend(self.execute_with_retry(&followups).await);
        }

        let profile = self.fusion.fuse(&results);
        let insights = self
            .synthesizer
            .synthesize(&request.goal, &request.persona, &profile)
            .await;
        let costs = self.ledger.summary();

        let report = render_report(
            &request.goal,
            &request.persona,
            &profile,
            &costs,
            insights.as_deref(),
        );

        tracing::info!(
            goal = %request.goal,
            total_cost = costs.total,
            empty = profile.is_empty(),
            "research session finished"
        );

        ResearchOutcome {
            report,
            profile,
            costs,
            degraded_plan: plan.degraded,
        }
    }

    /// Persist a rendered report under the configured output directory.
    pub fn save(
        &self,
        outcome: &ResearchOutcome,
        request: &ResearchRequest,
        explicit_path: Option<&Path>,
    ) -> Result<PathBuf> {
        save_report(
            &outcome.report,
            &request.goal,
            &request.persona,
            &self.output_dir,
            explicit_path,
        )
    }

    async fn execute_with_retry(&self, tasks: &[RoutedTask]) -> Vec<TaskResult> {
        if self.retry.attempts() <= 1 {
            return self.executor.execute(tasks, &self.ledger).await;
        }

        let first = self.executor.execute(tasks, &self.ledger).await;
        let mut results = Vec::with_capacity(first.len());
        for (task, result) in tasks.iter().zip(first) {
            if result.status == TaskStatus::Ok {
                results.push(result);
                continue;
            }
            // Remaining attempts go through the policy; the first attempt
            // already happened above.
            let remaining = RetryPolicy::new(self.retry.attempts() - 1, self.retry.pause());
            let retried = remaining
                .run(|| self.executor.execute_one(task, &self.ledger))
                .await;
            results.push(retried);
        }
        results
    }
}

fn select_llm_provider(config: &Config) -> Provider {
    match &config.llm.openai_api_key {
        Some(api_key) => Provider::OpenAI {
            api_key: api_key.clone(),
            api_base: config
                .llm
                .openai_api_base
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: config.llm.openai_model.clone(),
        },
        None => Provider::Ollama {
            base_url: config.llm.ollama_url.clone(),
            model: config.llm.ollama_model.clone(),
        },
    }
}

/// Planning runs on a smaller model when one is configured; the base
/// provider endpoint is kept either way.
fn select_planner_provider(config: &Config, base: &Provider) -> Provider {
    match &config.llm.planner_model {
        Some(model) => base.with_model(model),
        None => base.clone(),
    }
}

/// Route planner output, then splice in override tasks. An override removes
/// every routed task of its capability and takes the front of the list.
fn assemble_tasks(
    router: &Router,
    descriptors: &[TaskDescriptor],
    request: &ResearchRequest,
) -> Vec<RoutedTask> {
    let mut tasks = router.route_all(descriptors);

    if let Some(url) = &request.linkedin_override {
        tasks.retain(|t| t.capability != Capability::LinkedinProfile);
        tasks.insert(
            0,
            RoutedTask {
                descriptor: TaskDescriptor::new(format!("scrape profile {}", url)),
                capability: Capability::LinkedinProfile,
                input: url.clone(),
            },
        );
    }

    if let Some(handle) = &request.github_override {
        tasks.retain(|t| t.capability != Capability::GithubProfile);
        tasks.insert(
            0,
            RoutedTask {
                descriptor: TaskDescriptor::new(format!("scrape code profile {}", handle)),
                capability: Capability::GithubProfile,
                input: handle.clone(),
            },
        );
    }

    tasks
}

/// One follow-up round: when a profile scraper has neither succeeded nor
/// been overridden, mine successful web-search hits for profile URLs.
fn discovery_tasks(
    router: &Router,
    results: &[TaskResult],
    request: &ResearchRequest,
) -> Vec<RoutedTask> {
    let succeeded = |capability: Capability| {
        results
            .iter()
            .any(|r| r.capability == capability && r.status == TaskStatus::Ok)
    };

    let want_github = request.github_override.is_none() && !succeeded(Capability::GithubProfile);
    let want_linkedin =
        request.linkedin_override.is_none() && !succeeded(Capability::LinkedinProfile);
    if !want_github && !want_linkedin {
        return Vec::new();
    }

    let mut followups = Vec::new();
    let mut found_github = false;
    let mut found_linkedin = false;

    for result in results {
        let Some(ProviderPayload::SearchHits(hits)) = &result.payload else {
            continue;
        };
        for hit in hits {
            if want_github && !found_github {
                // A hit often points at a repository; the account is the
                // first path segment, not the last.
                if let Some(user) = github_user_from_url(&hit.url) {
                    found_github = true;
                    followups.push(router.route(&TaskDescriptor::new(format!(
                        "discovered github profile github.com/{}",
                        user
                    ))));
                }
            }
            if want_linkedin && !found_linkedin && hit.url.to_lowercase().contains("linkedin.com/in/")
            {
                found_linkedin = true;
                followups.push(router.route(&TaskDescriptor::new(format!(
                    "discovered profile {}",
                    hit.url
                ))));
            }
        }
    }

    followups
}

/// Account name from a code-hosting URL: the first path segment after the
/// domain, whether the hit points at the profile or at a repository.
fn github_user_from_url(url: &str) -> Option<String> {
    let lowered = url.to_lowercase();
    let offset = lowered.find("github.com/")? + "github.com/".len();
    let user = url[offset..]
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    if !user.is_empty()
        && user
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        Some(user.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMClient;
    use crate::providers::CapabilityProvider;
    use crate::types::{AppError, CodeProfileDoc, SearchHit};
    use async_trait::async_trait;

    struct SilentLLM;

    #[async_trait]
    impl LLMClient for SilentLLM {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(AppError::LLM("offline".to_string()))
        }

        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            Err(AppError::LLM("offline".to_string()))
        }

        fn model_name(&self) -> &str {
            "silent"
        }
    }

    struct HintingSearch;

    #[async_trait]
    impl CapabilityProvider for HintingSearch {
        fn capability(&self) -> Capability {
            Capability::GeneralSearch
        }

        fn name(&self) -> &str {
            "hinting_search"
        }

        async fn execute(&self, _input: &str) -> Result<ProviderPayload> {
            Ok(ProviderPayload::SearchHits(vec![SearchHit {
                title: "Jane Smith".to_string(),
                url: "https://www.linkedin.com/in/janesmith".to_string(),
                snippet: String::new(),
            }]))
        }
    }

    struct CannedLinkedin;

    #[async_trait]
    impl CapabilityProvider for CannedLinkedin {
        fn capability(&self) -> Capability {
            Capability::LinkedinProfile
        }

        fn name(&self) -> &str {
            "canned_linkedin"
        }

        async fn execute(&self, _input: &str) -> Result<ProviderPayload> {
            Ok(ProviderPayload::Profile(crate::types::ProfileDoc {
                name: Some("Jane Smith".to_string()),
                headline: Some("Staff Engineer".to_string()),
                experiences: vec![],
            }))
        }
    }

    struct CannedGithub;

    #[async_trait]
    impl CapabilityProvider for CannedGithub {
        fn capability(&self) -> Capability {
            Capability::GithubProfile
        }

        fn name(&self) -> &str {
            "canned_github"
        }

        async fn execute(&self, input: &str) -> Result<ProviderPayload> {
            Ok(ProviderPayload::CodeProfile(CodeProfileDoc {
                username: input.to_string(),
                name: Some("Jane Smith".to_string()),
                bio: None,
                location: None,
                company: None,
                followers: 1,
                repositories: vec![],
            }))
        }
    }

    fn test_config() -> Config {
        use crate::utils::config::*;
        use std::time::Duration;

        Config {
            llm: LLMConfig {
                openai_api_key: None,
                openai_api_base: None,
                openai_model: "gpt-4o-mini".to_string(),
                ollama_url: "http://localhost:11434".to_string(),
                ollama_model: "llama3.1".to_string(),
                planner_model: None,
            },
            search: SearchConfig { max_results: 5 },
            executor: ExecutorConfig {
                max_tasks: 8,
                max_retries: 1,
                retry_pause: Duration::from_secs(0),
                session_deadline: None,
            },
            fusion: FusionConfig {
                min_confidence: 0.0,
            },
            report: ReportConfig {
                output_dir: ".".to_string(),
            },
            github_token: None,
            linkedin_cookie: None,
        }
    }

    fn coordinator(registry: ProviderRegistry) -> ResearchCoordinator {
        let config = test_config();
        ResearchCoordinator::new(
            Planner::new(Box::new(SilentLLM), 8),
            Synthesizer::new(Box::new(SilentLLM)),
            Arc::new(registry),
            &config,
        )
    }

    #[tokio::test]
    async fn test_run_with_discovery_round() {
        // No linkedin task survives routing of the fallback plan, so the
        // profile fields can only arrive through the discovery round.
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(HintingSearch));
        registry.register(Arc::new(CannedLinkedin));

        let coordinator = coordinator(registry);
        let request = ResearchRequest::new("Jane Smith", Persona::general());
        let outcome = coordinator.run(&request).await;

        assert_eq!(outcome.profile.name.as_deref(), Some("Jane Smith"));
        assert_eq!(outcome.profile.provenance["name"].source, "linkedin");
        assert!(outcome.degraded_plan);
        assert!(outcome.report.contains("Jane Smith"));
    }

    #[tokio::test]
    async fn test_override_bypasses_router() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(CannedGithub));

        let coordinator = coordinator(registry);
        let mut request = ResearchRequest::new("Jane Smith", Persona::general());
        request.github_override = Some("janesmith".to_string());
        let outcome = coordinator.run(&request).await;

        assert_eq!(outcome.profile.name.as_deref(), Some("Jane Smith"));
    }

    #[tokio::test]
    async fn test_all_failures_yield_no_data_report() {
        let coordinator = coordinator(ProviderRegistry::new());
        let request = ResearchRequest::new("Jane Smith", Persona::general());
        let outcome = coordinator.run(&request).await;

        assert!(outcome.profile.is_empty());
        assert!(outcome.report.contains("No data could be collected"));
    }

    #[test]
    fn test_planner_model_overrides_base_provider() {
        let mut config = test_config();
        config.llm.planner_model = Some("llama3.1:8b".to_string());

        let base = select_llm_provider(&config);
        match select_planner_provider(&config, &base) {
            Provider::Ollama { model, base_url } => {
                assert_eq!(model, "llama3.1:8b");
                assert_eq!(base_url, config.llm.ollama_url);
            }
            _ => panic!("Expected Ollama provider"),
        }

        config.llm.planner_model = None;
        match select_planner_provider(&config, &base) {
            Provider::Ollama { model, .. } => assert_eq!(model, config.llm.ollama_model),
            _ => panic!("Expected Ollama provider"),
        }
    }

    #[test]
    fn test_discovery_extracts_account_from_repository_url() {
        let router = Router::new("Jane Smith");
        let request = ResearchRequest::new("Jane Smith", Persona::general());
        let results = vec![TaskResult::ok(
            uuid::Uuid::new_v4(),
            Capability::GeneralSearch,
            ProviderPayload::SearchHits(vec![SearchHit {
                title: "janesmith/widget".to_string(),
                url: "https://github.com/janesmith/widget".to_string(),
                snippet: String::new(),
            }]),
        )];

        let followups = discovery_tasks(&router, &results, &request);
        assert_eq!(followups.len(), 1);
        assert_eq!(followups[0].capability, Capability::GithubProfile);
        // The account, not the repository name
        assert_eq!(followups[0].input, "janesmith");
    }

    #[test]
    fn test_github_user_from_url_cases() {
        assert_eq!(
            github_user_from_url("https://github.com/janesmith").as_deref(),
            Some("janesmith")
        );
        assert_eq!(
            github_user_from_url("https://github.com/janesmith/widget/issues/4").as_deref(),
            Some("janesmith")
        );
        assert_eq!(
            github_user_from_url("https://GitHub.com/JaneSmith?tab=repositories").as_deref(),
            Some("JaneSmith")
        );
        assert!(github_user_from_url("https://github.com/").is_none());
        assert!(github_user_from_url("https://example.com/janesmith").is_none());
    }

    #[test]
    fn test_discovery_skipped_when_scraper_succeeded() {
        let router = Router::new("Jane Smith");
        let request = ResearchRequest::new("Jane Smith", Persona::general());
        let results = vec![TaskResult::ok(
            uuid::Uuid::new_v4(),
            Capability::GithubProfile,
            ProviderPayload::CodeProfile(CodeProfileDoc::default()),
        )];
        let followups = discovery_tasks(&router, &results, &request);
        // No linkedin hint in any payload and github already succeeded
        assert!(followups.is_empty());
    }
}
