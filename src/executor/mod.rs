//! Concurrent task execution.
//!
//! Each routed task runs as an independent unit of work; one task's failure
//! never aborts or blocks a sibling. The ledger is charged before the
//! provider call is issued because metered capabilities bill the attempt,
//! not the outcome. Each task is attempted exactly once here; retries
//! belong to the caller layer (see [`retry`]).

pub mod retry;

use crate::ledger::CostLedger;
use crate::providers::{CapabilityProvider, ProviderRegistry};
use crate::types::{RoutedTask, TaskResult, TaskStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Runs routed tasks concurrently against the provider registry.
pub struct Executor {
    registry: Arc<ProviderRegistry>,
    session_deadline: Option<Duration>,
}

impl Executor {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            session_deadline: None,
        }
    }

    /// Layer a session-level deadline above the per-capability budgets.
    /// When it elapses, still-pending tasks are marked `Timeout` and
    /// whatever already completed is returned.
    pub fn with_session_deadline(mut self, deadline: Duration) -> Self {
        self.session_deadline = Some(deadline);
        self
    }

    /// Execute all tasks concurrently. The returned list matches the input
    /// list's order regardless of completion order.
    pub async fn execute(&self, tasks: &[RoutedTask], ledger: &Arc<CostLedger>) -> Vec<TaskResult> {
        if tasks.is_empty() {
            tracing::info!("no routed tasks, skipping execution");
            return Vec::new();
        }

        let mut set: JoinSet<(usize, TaskResult)> = JoinSet::new();
        for (index, task) in tasks.iter().enumerate() {
            let provider = self.registry.get(task.capability);
            let task = task.clone();
            let ledger = Arc::clone(ledger);
            set.spawn(async move { (index, run_task(provider, task, ledger).await) });
        }

        let mut slots: Vec<Option<TaskResult>> = vec![None; tasks.len()];

        let collect = async {
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((index, result)) => slots[index] = Some(result),
                    Err(e) => tracing::error!(error = %e, "task join failed"),
                }
            }
        };

        match self.session_deadline {
            Some(limit) => {
                if tokio::time::timeout(limit, collect).await.is_err() {
                    tracing::warn!(?limit, "session deadline elapsed, abandoning pending tasks");
                    set.abort_all();
                }
            }
            None => collect.await,
        }

        // Pending slots after a deadline (or a panicked worker) become
        // timeouts so the output always matches the input list.
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    TaskResult::timeout(tasks[index].descriptor.id, tasks[index].capability)
                })
            })
            .collect()
    }

    /// Execute a single routed task. Exposed for callers that wrap task
    /// execution in their own policy (e.g. [`retry::RetryPolicy`]).
    pub async fn execute_one(&self, task: &RoutedTask, ledger: &Arc<CostLedger>) -> TaskResult {
        run_task(
            self.registry.get(task.capability),
            task.clone(),
            Arc::clone(ledger),
        )
        .await
    }
}

/// One isolated task attempt: charge, call with budget, classify outcome.
async fn run_task(
    provider: Option<Arc<dyn CapabilityProvider>>,
    task: RoutedTask,
    ledger: Arc<CostLedger>,
) -> TaskResult {
    let task_id = task.descriptor.id;
    let capability = task.capability;

    let Some(provider) = provider else {
        let result = TaskResult::error(task_id, capability, "no provider registered");
        log_completion(&result);
        return result;
    };

    // Charged before the call: the attempt bills, success or not. Free
    // capabilities get a zero-cost entry for audit symmetry.
    ledger.charge(capability);

    let budget = capability.timeout_budget();
    let result = match tokio::time::timeout(budget, provider.execute(&task.input)).await {
        Ok(Ok(payload)) => TaskResult::ok(task_id, capability, payload),
        Ok(Err(e)) => TaskResult::error(task_id, capability, e.to_string()),
        // The in-flight call is abandoned best-effort; the remote side may
        // keep working.
        Err(_) => TaskResult::timeout(task_id, capability),
    };

    log_completion(&result);
    result
}

fn log_completion(result: &TaskResult) {
    match result.status {
        TaskStatus::Ok => tracing::info!(
            task_id = %result.task_id,
            capability = %result.capability,
            status = "ok",
            "task completed"
        ),
        TaskStatus::Error => tracing::warn!(
            task_id = %result.task_id,
            capability = %result.capability,
            status = "error",
            error = result.error.as_deref().unwrap_or(""),
            "task completed"
        ),
        TaskStatus::Timeout => tracing::warn!(
            task_id = %result.task_id,
            capability = %result.capability,
            status = "timeout",
            "task completed"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AppError, Capability, ProviderPayload, Result, SearchHit, TaskDescriptor};
    use async_trait::async_trait;

    struct OkSearch;

    #[async_trait]
    impl CapabilityProvider for OkSearch {
        fn capability(&self) -> Capability {
            Capability::GeneralSearch
        }

        fn name(&self) -> &str {
            "ok_search"
        }

        async fn execute(&self, input: &str) -> Result<ProviderPayload> {
            Ok(ProviderPayload::SearchHits(vec![SearchHit {
                title: input.to_string(),
                url: "https://example.com".to_string(),
                snippet: String::new(),
            }]))
        }
    }

    struct FailingAcademic;

    #[async_trait]
    impl CapabilityProvider for FailingAcademic {
        fn capability(&self) -> Capability {
            Capability::AcademicSearch
        }

        fn name(&self) -> &str {
            "failing_academic"
        }

        async fn execute(&self, _input: &str) -> Result<ProviderPayload> {
            Err(AppError::Provider("upstream 500".to_string()))
        }
    }

    struct StalledGithub;

    #[async_trait]
    impl CapabilityProvider for StalledGithub {
        fn capability(&self) -> Capability {
            Capability::GithubProfile
        }

        fn name(&self) -> &str {
            "stalled_github"
        }

        async fn execute(&self, _input: &str) -> Result<ProviderPayload> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ProviderPayload::SearchHits(vec![]))
        }
    }

    fn routed(capability: Capability, text: &str) -> RoutedTask {
        RoutedTask {
            descriptor: TaskDescriptor::new(text),
            capability,
            input: text.to_string(),
        }
    }

    fn registry() -> Arc<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(OkSearch));
        registry.register(Arc::new(FailingAcademic));
        registry.register(Arc::new(StalledGithub));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_empty_task_list_short_circuits() {
        let executor = Executor::new(registry());
        let ledger = Arc::new(CostLedger::new());

        let results = executor.execute(&[], &ledger).await;
        assert!(results.is_empty());
        assert_eq!(ledger.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_order_preserved() {
        let executor = Executor::new(registry());
        let ledger = Arc::new(CostLedger::new());
        let tasks = vec![
            routed(Capability::GeneralSearch, "first"),
            routed(Capability::AcademicSearch, "second"),
            routed(Capability::GeneralSearch, "third"),
        ];

        let results = executor.execute(&tasks, &ledger).await;
        let statuses: Vec<TaskStatus> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![TaskStatus::Ok, TaskStatus::Error, TaskStatus::Ok]
        );
        // Result order follows input order, by task id
        for (task, result) in tasks.iter().zip(&results) {
            assert_eq!(task.descriptor.id, result.task_id);
        }
    }

    #[tokio::test]
    async fn test_cost_charged_regardless_of_outcome() {
        let executor = Executor::new(registry());
        let ledger = Arc::new(CostLedger::new());
        let tasks = vec![
            routed(Capability::GeneralSearch, "ok task"),
            routed(Capability::AcademicSearch, "failing task"),
        ];

        executor.execute(&tasks, &ledger).await;

        let summary = ledger.summary();
        assert_eq!(summary.per_capability[&Capability::GeneralSearch].units, 1);
        assert_eq!(summary.per_capability[&Capability::AcademicSearch].units, 1);
        assert_eq!(summary.per_capability[&Capability::AcademicSearch].cost, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capability_budget_times_out() {
        let executor = Executor::new(registry());
        let ledger = Arc::new(CostLedger::new());
        let tasks = vec![routed(Capability::GithubProfile, "octocat")];

        let results = executor.execute(&tasks, &ledger).await;
        assert_eq!(results[0].status, TaskStatus::Timeout);
        // The attempt was still charged
        assert_eq!(ledger.entry_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_deadline_marks_pending_as_timeout() {
        let executor = Executor::new(registry()).with_session_deadline(Duration::from_secs(1));
        let ledger = Arc::new(CostLedger::new());
        let tasks = vec![
            routed(Capability::GeneralSearch, "fast"),
            routed(Capability::GithubProfile, "stalled"),
        ];

        let results = executor.execute(&tasks, &ledger).await;
        assert_eq!(results[0].status, TaskStatus::Ok);
        assert_eq!(results[1].status, TaskStatus::Timeout);
    }

    #[tokio::test]
    async fn test_missing_provider_yields_error() {
        let executor = Executor::new(Arc::new(ProviderRegistry::new()));
        let ledger = Arc::new(CostLedger::new());
        let tasks = vec![routed(Capability::GeneralSearch, "anything")];

        let results = executor.execute(&tasks, &ledger).await;
        assert_eq!(results[0].status, TaskStatus::Error);
        // No provider, no charge
        assert_eq!(ledger.entry_count(), 0);
    }
}
