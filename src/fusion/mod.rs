//! Evidence fusion.
//!
//! Successful task payloads are merged into one unified profile. The merge
//! is deterministic: contributions are ordered by capability priority, then
//! confidence, then task id, so the fused output is identical no matter
//! which order the executor delivered the results in. Scalars keep the
//! first (highest-ranked) value; list entries are deduplicated by natural
//! key, with confidence deciding collisions.

use crate::types::{
    CodeProfileDoc, PaperHit, ProfileDoc, ProjectEntry, ProviderPayload, SkillEntry, SourceTag,
    TaskResult, TaskStatus, UnifiedProfile, WorkEntry,
};
use std::collections::HashMap;

const LANGUAGE_CATEGORY: &str = "Programming Languages";
const TOPIC_CATEGORY: &str = "Technologies & Topics";

/// Merges successful task payloads into a [`UnifiedProfile`].
pub struct FusionEngine {
    min_confidence: f32,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FusionEngine {
    pub fn new() -> Self {
        Self {
            min_confidence: 0.0,
        }
    }

    /// Drop contributions whose confidence falls below `threshold` before
    /// merging. Zero (the default) keeps everything.
    pub fn with_min_confidence(mut self, threshold: f32) -> Self {
        self.min_confidence = threshold;
        self
    }

    /// Fuse task results into one profile. Only `Ok` results contribute;
    /// errors and timeouts are ignored here (the executor already logged
    /// them). Order-independent for any permutation of `results`.
    pub fn fuse(&self, results: &[TaskResult]) -> UnifiedProfile {
        let mut contributions: Vec<&TaskResult> = results
            .iter()
            .filter(|r| r.status == TaskStatus::Ok && r.payload.is_some())
            .filter(|r| {
                if r.provenance.confidence < self.min_confidence {
                    tracing::debug!(
                        task_id = %r.task_id,
                        capability = %r.capability,
                        confidence = r.provenance.confidence,
                        threshold = self.min_confidence,
                        "fusion skip: below confidence threshold"
                    );
                    false
                } else {
                    true
                }
            })
            .collect();

        // Total order over contributions makes fusion a pure function of
        // the result set.
        contributions.sort_by(|a, b| {
            b.capability
                .priority()
                .cmp(&a.capability.priority())
                .then(
                    b.provenance
                        .confidence
                        .total_cmp(&a.provenance.confidence),
                )
                .then(a.task_id.cmp(&b.task_id))
        });

        let mut merge = Merge::default();
        for result in &contributions {
            let tag = SourceTag {
                source: result.provenance.source_label.clone(),
                confidence: result.provenance.confidence,
            };
            let priority = result.capability.priority();
            match result.payload.as_ref() {
                Some(ProviderPayload::Profile(doc)) => merge.profile(doc, &tag, priority),
                Some(ProviderPayload::CodeProfile(doc)) => merge.code_profile(doc, &tag, priority),
                Some(ProviderPayload::Papers(papers)) => merge.papers(papers, &tag, priority),
                // Search hits feed discovery, not fused fields.
                Some(ProviderPayload::SearchHits(_)) | None => {}
            }
        }

        let profile = merge.finish();
        tracing::info!(
            contributions = contributions.len(),
            work_entries = profile.work_history.len(),
            projects = profile.projects.len(),
            skills = profile.skills.len(),
            "fusion complete"
        );
        profile
    }
}

/// Rank used to settle natural-key collisions.
type Rank = (f32, u8);

fn beats(new: Rank, old: Rank) -> bool {
    new.0.total_cmp(&old.0).then(new.1.cmp(&old.1)) == std::cmp::Ordering::Greater
}

fn norm_key(text: &str) -> String {
    text.trim().to_lowercase()
}

#[derive(Default)]
struct Merge {
    profile: UnifiedProfile,
    work_keys: HashMap<String, (usize, Rank)>,
    project_keys: HashMap<String, (usize, Rank)>,
    skill_keys: HashMap<String, (usize, Rank)>,
}

impl Merge {
    fn profile(&mut self, doc: &ProfileDoc, tag: &SourceTag, priority: u8) {
        if let Some(name) = &doc.name {
            self.set_name(name, tag);
        }
        if let Some(headline) = &doc.headline {
            self.set_headline(headline, tag);
        }
        for experience in &doc.experiences {
            self.add_work(
                WorkEntry {
                    title: experience.title.clone(),
                    company: experience.company.clone(),
                    date_range: experience.date_range.clone(),
                    source: tag.clone(),
                },
                priority,
            );
        }
    }

    fn code_profile(&mut self, doc: &CodeProfileDoc, tag: &SourceTag, priority: u8) {
        if let Some(name) = &doc.name {
            self.set_name(name, tag);
        }
        if let Some(bio) = &doc.bio {
            self.set_headline(bio, tag);
        }

        for repo in &doc.repositories {
            self.add_project(
                ProjectEntry {
                    name: repo.name.clone(),
                    description: repo.description.clone(),
                    url: Some(repo.url.clone()),
                    language: repo.language.clone(),
                    stars: repo.stars,
                    topics: repo.topics.clone(),
                    source: tag.clone(),
                },
                priority,
            );

            if let Some(language) = &repo.language {
                self.add_skill(
                    SkillEntry {
                        name: language.clone(),
                        category: LANGUAGE_CATEGORY.to_string(),
                        source: tag.clone(),
                    },
                    priority,
                );
            }
            for topic in &repo.topics {
                self.add_skill(
                    SkillEntry {
                        name: topic.clone(),
                        category: TOPIC_CATEGORY.to_string(),
                        source: tag.clone(),
                    },
                    priority,
                );
            }
        }
    }

    fn papers(&mut self, papers: &[PaperHit], tag: &SourceTag, priority: u8) {
        for paper in papers {
            self.add_project(
                ProjectEntry {
                    name: paper.title.clone(),
                    description: paper.summary.clone(),
                    url: paper.url.clone(),
                    language: None,
                    stars: 0,
                    topics: Vec::new(),
                    source: tag.clone(),
                },
                priority,
            );
        }
    }

    // Scalars: contributions arrive best-first, so the first value sticks.
    fn set_name(&mut self, name: &str, tag: &SourceTag) {
        let name = name.trim();
        if self.profile.name.is_none() && !name.is_empty() {
            self.profile.name = Some(name.to_string());
            self.profile
                .provenance
                .insert("name".to_string(), tag.clone());
        }
    }

    fn set_headline(&mut self, headline: &str, tag: &SourceTag) {
        let headline = headline.trim();
        if self.profile.headline.is_none() && !headline.is_empty() {
            self.profile.headline = Some(headline.to_string());
            self.profile
                .provenance
                .insert("headline".to_string(), tag.clone());
        }
    }

    fn add_work(&mut self, entry: WorkEntry, priority: u8) {
        let key = format!("{}|{}", norm_key(&entry.title), norm_key(&entry.company));
        let rank = (entry.source.confidence, priority);
        match self.work_keys.get(&key) {
            Some(&(index, existing)) if beats(rank, existing) => {
                self.record_provenance("work_history", &key, &entry.source);
                self.profile.work_history[index] = entry;
                self.work_keys.insert(key, (index, rank));
            }
            Some(_) => {}
            None => {
                self.record_provenance("work_history", &key, &entry.source);
                self.work_keys
                    .insert(key, (self.profile.work_history.len(), rank));
                self.profile.work_history.push(entry);
            }
        }
    }

    fn add_project(&mut self, entry: ProjectEntry, priority: u8) {
        let key = norm_key(&entry.name);
        let rank = (entry.source.confidence, priority);
        match self.project_keys.get(&key) {
            Some(&(index, existing)) if beats(rank, existing) => {
                self.record_provenance("projects", &key, &entry.source);
                self.profile.projects[index] = entry;
                self.project_keys.insert(key, (index, rank));
            }
            Some(_) => {}
            None => {
                self.record_provenance("projects", &key, &entry.source);
                self.project_keys
                    .insert(key, (self.profile.projects.len(), rank));
                self.profile.projects.push(entry);
            }
        }
    }

    fn add_skill(&mut self, entry: SkillEntry, priority: u8) {
        let key = norm_key(&entry.name);
        let rank = (entry.source.confidence, priority);
        match self.skill_keys.get(&key) {
            Some(&(index, existing)) if beats(rank, existing) => {
                self.record_provenance("skills", &key, &entry.source);
                self.profile.skills[index] = entry;
                self.skill_keys.insert(key, (index, rank));
            }
            Some(_) => {}
            None => {
                self.record_provenance("skills", &key, &entry.source);
                self.skill_keys
                    .insert(key, (self.profile.skills.len(), rank));
                self.profile.skills.push(entry);
            }
        }
    }

    fn record_provenance(&mut self, list: &str, key: &str, tag: &SourceTag) {
        self.profile
            .provenance
            .insert(format!("{}:{}", list, key), tag.clone());
    }

    fn finish(self) -> UnifiedProfile {
        self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Capability, ExperienceDoc, RepoDoc};
    use uuid::Uuid;

    fn linkedin_result(name: &str, headline: &str) -> TaskResult {
        TaskResult::ok(
            Uuid::new_v4(),
            Capability::LinkedinProfile,
            ProviderPayload::Profile(ProfileDoc {
                name: Some(name.to_string()),
                headline: Some(headline.to_string()),
                experiences: vec![ExperienceDoc {
                    title: "Staff Engineer".to_string(),
                    company: "Initech".to_string(),
                    date_range: Some("2021 - Present".to_string()),
                }],
            }),
        )
    }

    fn github_result(name: &str) -> TaskResult {
        TaskResult::ok(
            Uuid::new_v4(),
            Capability::GithubProfile,
            ProviderPayload::CodeProfile(CodeProfileDoc {
                username: "jsmith".to_string(),
                name: Some(name.to_string()),
                bio: Some("Builds compilers".to_string()),
                location: None,
                company: None,
                followers: 10,
                repositories: vec![RepoDoc {
                    name: "widget".to_string(),
                    description: Some("A widget".to_string()),
                    stars: 42,
                    forks: 7,
                    language: Some("Rust".to_string()),
                    url: "https://github.com/jsmith/widget".to_string(),
                    topics: vec!["cli".to_string()],
                }],
            }),
        )
    }

    #[test]
    fn test_higher_priority_scalar_wins() {
        let results = vec![github_result("J. Smith"), linkedin_result("Jane Smith", "Staff Engineer")];
        let profile = FusionEngine::new().fuse(&results);
        assert_eq!(profile.name.as_deref(), Some("Jane Smith"));
        assert_eq!(profile.provenance["name"].source, "linkedin");
    }

    #[test]
    fn test_fusion_is_order_independent() {
        let a = linkedin_result("Jane Smith", "Staff Engineer");
        let b = github_result("J. Smith");
        let c = TaskResult::error(Uuid::new_v4(), Capability::GeneralSearch, "boom");

        let forward = FusionEngine::new().fuse(&[a.clone(), b.clone(), c.clone()]);
        let reversed = FusionEngine::new().fuse(&[c, b, a]);

        assert_eq!(forward.name, reversed.name);
        assert_eq!(forward.headline, reversed.headline);
        assert_eq!(forward.work_history.len(), reversed.work_history.len());
        assert_eq!(forward.projects.len(), reversed.projects.len());
        assert_eq!(
            serde_json::to_string(&forward.provenance).unwrap(),
            serde_json::to_string(&reversed.provenance).unwrap()
        );
    }

    #[test]
    fn test_failed_results_do_not_contribute() {
        let results = vec![
            TaskResult::error(Uuid::new_v4(), Capability::LinkedinProfile, "blocked"),
            TaskResult::timeout(Uuid::new_v4(), Capability::GithubProfile),
        ];
        let profile = FusionEngine::new().fuse(&results);
        assert!(profile.is_empty());
    }

    #[test]
    fn test_confidence_threshold_drops_weak_sources() {
        let results = vec![github_result("J. Smith")];
        let profile = FusionEngine::new().with_min_confidence(0.9).fuse(&results);
        assert!(profile.is_empty());
    }

    #[test]
    fn test_work_entries_dedup_by_title_and_company() {
        let mut first = linkedin_result("Jane Smith", "Staff Engineer");
        let second = linkedin_result("Jane Smith", "Staff Engineer");
        // Same natural key from both, one entry retained
        first.task_id = Uuid::new_v4();
        let profile = FusionEngine::new().fuse(&[first, second]);
        assert_eq!(profile.work_history.len(), 1);
    }

    #[test]
    fn test_code_profile_populates_projects_and_skills() {
        let profile = FusionEngine::new().fuse(&[github_result("J. Smith")]);
        assert_eq!(profile.projects.len(), 1);
        assert_eq!(profile.projects[0].name, "widget");
        let skill_names: Vec<&str> = profile.skills.iter().map(|s| s.name.as_str()).collect();
        assert!(skill_names.contains(&"Rust"));
        assert!(skill_names.contains(&"cli"));
    }

    #[test]
    fn test_papers_become_projects() {
        let result = TaskResult::ok(
            Uuid::new_v4(),
            Capability::AcademicSearch,
            ProviderPayload::Papers(vec![PaperHit {
                title: "Attention Is All You Need".to_string(),
                url: Some("https://arxiv.org/abs/1706.03762".to_string()),
                authors: vec!["Jane Smith".to_string()],
                summary: Some("Transformers.".to_string()),
                updated: "2017-06-12".to_string(),
            }]),
        );
        let profile = FusionEngine::new().fuse(&[result]);
        assert_eq!(profile.projects.len(), 1);
        assert_eq!(profile.projects[0].source.source, "arxiv");
    }

    #[test]
    fn test_search_hits_do_not_create_fields() {
        let result = TaskResult::ok(
            Uuid::new_v4(),
            Capability::GeneralSearch,
            ProviderPayload::SearchHits(vec![crate::types::SearchHit {
                title: "Jane Smith - Initech".to_string(),
                url: "https://example.com".to_string(),
                snippet: String::new(),
            }]),
        );
        let profile = FusionEngine::new().fuse(&[result]);
        assert!(profile.is_empty());
    }
}
