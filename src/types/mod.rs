use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

// ============= Capabilities =============

/// External capability categories a task can be routed to.
///
/// Each capability declares its own cost model, timeout budget, and fusion
/// priority so the rest of the pipeline never special-cases a provider.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Professional-network profile scraper (highest-trust source).
    LinkedinProfile,
    /// Code-hosting profile and repository scraper.
    GithubProfile,
    /// Academic index (arXiv) search.
    AcademicSearch,
    /// General web search.
    GeneralSearch,
}

/// Billing model declared by a capability.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CostModel {
    Free,
    FixedPerCall(f64),
}

impl CostModel {
    /// Price per unit; zero for free capabilities.
    pub fn unit_price(&self) -> f64 {
        match self {
            CostModel::Free => 0.0,
            CostModel::FixedPerCall(price) => *price,
        }
    }
}

impl Capability {
    /// Short label used in logs, provenance tags, and report sources.
    pub fn label(&self) -> &'static str {
        match self {
            Capability::LinkedinProfile => "linkedin",
            Capability::GithubProfile => "github",
            Capability::AcademicSearch => "arxiv",
            Capability::GeneralSearch => "web",
        }
    }

    /// Declared cost model. Metered capabilities charge per call attempt,
    /// not per successful outcome.
    pub fn cost_model(&self) -> CostModel {
        match self {
            Capability::LinkedinProfile => CostModel::FixedPerCall(0.01),
            Capability::GithubProfile => CostModel::Free,
            Capability::AcademicSearch => CostModel::Free,
            Capability::GeneralSearch => CostModel::FixedPerCall(0.005),
        }
    }

    /// Per-task timeout budget for one provider call.
    pub fn timeout_budget(&self) -> Duration {
        match self {
            Capability::LinkedinProfile => Duration::from_secs(45),
            Capability::GithubProfile => Duration::from_secs(30),
            Capability::AcademicSearch => Duration::from_secs(30),
            Capability::GeneralSearch => Duration::from_secs(30),
        }
    }

    /// Merge priority during fusion; higher wins scalar conflicts.
    pub fn priority(&self) -> u8 {
        match self {
            Capability::LinkedinProfile => 3,
            Capability::GithubProfile => 2,
            Capability::AcademicSearch => 1,
            Capability::GeneralSearch => 0,
        }
    }

    /// Default confidence attached to payloads from this capability.
    pub fn default_confidence(&self) -> f32 {
        match self {
            Capability::LinkedinProfile => 0.9,
            Capability::GithubProfile => 0.85,
            Capability::AcademicSearch => 0.7,
            Capability::GeneralSearch => 0.5,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============= Task Types =============

/// A planned unit of work, before capability assignment.
///
/// Immutable once created; lives only within one planning/execution cycle.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TaskDescriptor {
    pub id: Uuid,
    pub raw_text: String,
}

impl TaskDescriptor {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            raw_text: raw_text.into(),
        }
    }
}

/// A task after capability assignment and input normalization.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoutedTask {
    pub descriptor: TaskDescriptor,
    pub capability: Capability,
    pub input: String,
}

/// Terminal status of one executed task.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Ok,
    Error,
    Timeout,
}

/// Source and confidence tag carried by every task result and fused entry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Provenance {
    pub source_label: String,
    pub confidence: f32,
}

impl Provenance {
    pub fn from_capability(capability: Capability) -> Self {
        Self {
            source_label: capability.label().to_string(),
            confidence: capability.default_confidence(),
        }
    }
}

/// Outcome of one executed task. `status == Ok` implies `payload` is present
/// and `error` is absent.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaskResult {
    pub task_id: Uuid,
    pub capability: Capability,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<ProviderPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub provenance: Provenance,
}

impl TaskResult {
    pub fn ok(task_id: Uuid, capability: Capability, payload: ProviderPayload) -> Self {
        Self {
            task_id,
            capability,
            status: TaskStatus::Ok,
            payload: Some(payload),
            error: None,
            provenance: Provenance::from_capability(capability),
        }
    }

    pub fn error(task_id: Uuid, capability: Capability, message: impl Into<String>) -> Self {
        Self {
            task_id,
            capability,
            status: TaskStatus::Error,
            payload: None,
            error: Some(message.into()),
            provenance: Provenance::from_capability(capability),
        }
    }

    pub fn timeout(task_id: Uuid, capability: Capability) -> Self {
        Self {
            task_id,
            capability,
            status: TaskStatus::Timeout,
            payload: None,
            error: Some(AppError::ProviderTimeout(capability.timeout_budget()).to_string()),
            provenance: Provenance::from_capability(capability),
        }
    }
}

// ============= Provider Payloads =============

/// Typed payload returned by a capability provider.
///
/// Providers convert their wire formats into these variants at the boundary;
/// nothing downstream inspects untyped maps.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ProviderPayload {
    SearchHits(Vec<SearchHit>),
    Papers(Vec<PaperHit>),
    Profile(ProfileDoc),
    CodeProfile(CodeProfileDoc),
}

/// One general web search result.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// One academic-index hit.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaperHit {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub updated: String,
}

/// Professional-network profile document.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProfileDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    pub experiences: Vec<ExperienceDoc>,
}

/// One position extracted from a professional-network profile.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExperienceDoc {
    pub title: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,
}

/// Code-hosting profile plus repositories.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CodeProfileDoc {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub followers: u64,
    pub repositories: Vec<RepoDoc>,
}

/// One repository belonging to a code-hosting profile.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RepoDoc {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub url: String,
    pub topics: Vec<String>,
}

// ============= Cost Accounting =============

/// One append-only ledger entry; never mutated or removed after commit.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CostEntry {
    pub session_id: Uuid,
    pub capability: Capability,
    pub units: u64,
    pub unit_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl CostEntry {
    pub fn cost(&self) -> f64 {
        self.units as f64 * self.unit_price
    }
}

/// Aggregated usage for one capability within a session.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct CapabilityUsage {
    pub units: u64,
    pub cost: f64,
}

/// Per-capability and total cost for one session.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CostSummary {
    pub session_id: Option<Uuid>,
    pub per_capability: BTreeMap<Capability, CapabilityUsage>,
    pub total: f64,
}

// ============= Unified Profile =============

/// Source tag attached to every fused scalar and list entry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SourceTag {
    pub source: String,
    pub confidence: f32,
}

/// Maps fused field keys (`name`, `work_history:<key>`, ...) to the source
/// that produced them. BTreeMap keeps serialized output stable.
pub type ProvenanceIndex = BTreeMap<String, SourceTag>;

/// One fused employment entry. Natural key: title + company.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkEntry {
    pub title: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,
    pub source: SourceTag,
}

/// One fused project entry. Natural key: project name.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProjectEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub stars: u64,
    pub topics: Vec<String>,
    pub source: SourceTag,
}

/// One fused skill entry. Natural key: skill name.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SkillEntry {
    pub name: String,
    pub category: String,
    pub source: SourceTag,
}

/// The fused research record. Rebuilt fresh each run, never mutated
/// incrementally across sessions.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UnifiedProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    pub work_history: Vec<WorkEntry>,
    pub projects: Vec<ProjectEntry>,
    pub skills: Vec<SkillEntry>,
    pub provenance: ProvenanceIndex,
}

impl UnifiedProfile {
    /// True when fusion produced no scalar and no list entry at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.headline.is_none()
            && self.work_history.is_empty()
            && self.projects.is_empty()
            && self.skills.is_empty()
    }

    /// Distinct source labels that contributed at least one retained field.
    pub fn sources(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .provenance
            .values()
            .map(|tag| tag.source.clone())
            .collect();
        labels.sort();
        labels.dedup();
        labels
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider timed out after {0:?}")]
    ProviderTimeout(Duration),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
