//! Fusion must be a pure function of the result set: any delivery order,
//! any duplicate mix, same fused profile.

use dossier::types::{
    Capability, CodeProfileDoc, ExperienceDoc, PaperHit, ProfileDoc, ProviderPayload, RepoDoc,
    TaskResult,
};
use dossier::FusionEngine;
use uuid::Uuid;

fn linkedin() -> TaskResult {
    TaskResult::ok(
        Uuid::new_v4(),
        Capability::LinkedinProfile,
        ProviderPayload::Profile(ProfileDoc {
            name: Some("Jane Smith".to_string()),
            headline: Some("Staff Engineer at Initech".to_string()),
            experiences: vec![ExperienceDoc {
                title: "Staff Engineer".to_string(),
                company: "Initech".to_string(),
                date_range: Some("2021 - Present".to_string()),
            }],
        }),
    )
}

fn github() -> TaskResult {
    TaskResult::ok(
        Uuid::new_v4(),
        Capability::GithubProfile,
        ProviderPayload::CodeProfile(CodeProfileDoc {
            username: "jsmith".to_string(),
            name: Some("J. Smith".to_string()),
            bio: Some("Compiler person".to_string()),
            location: None,
            company: None,
            followers: 12,
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

fn arxiv() -> TaskResult {
    TaskResult::ok(
        Uuid::new_v4(),
        Capability::AcademicSearch,
        ProviderPayload::Papers(vec![PaperHit {
            title: "On Widgets".to_string(),
            url: Some("https://arxiv.org/abs/0000.00000".to_string()),
            authors: vec!["Jane Smith".to_string()],
            summary: Some("Widgets, formally.".to_string()),
            updated: "2024-01-01".to_string(),
        }]),
    )
}

fn failed() -> TaskResult {
    TaskResult::error(Uuid::new_v4(), Capability::GeneralSearch, "backend down")
}

fn fingerprint(results: &[TaskResult]) -> String {
    let profile = FusionEngine::new().fuse(results);
    serde_json::to_string(&profile).unwrap()
}

#[test]
fn permutations_fuse_identically() {
    let a = linkedin();
    let b = github();
    let c = arxiv();
    let d = failed();

    let baseline = fingerprint(&[a.clone(), b.clone(), c.clone(), d.clone()]);
    assert_eq!(
        baseline,
        fingerprint(&[d.clone(), c.clone(), b.clone(), a.clone()])
    );
    assert_eq!(baseline, fingerprint(&[b, d, a, c]));
}

#[test]
fn highest_priority_source_wins_scalar_conflicts() {
    // github delivers a name too, but linkedin has the higher priority
    let profile = FusionEngine::new().fuse(&[github(), linkedin()]);
    assert_eq!(profile.name.as_deref(), Some("Jane Smith"));
    assert_eq!(profile.provenance["name"].source, "linkedin");
    // the headline came from linkedin for the same reason
    assert_eq!(profile.provenance["headline"].source, "linkedin");
}

#[test]
fn all_list_kinds_populated_with_provenance() {
    let profile = FusionEngine::new().fuse(&[linkedin(), github(), arxiv()]);

    assert_eq!(profile.work_history.len(), 1);
    assert_eq!(profile.projects.len(), 2); // one repo, one paper
    assert!(!profile.skills.is_empty());

    let sources = profile.sources();
    assert!(sources.contains(&"linkedin".to_string()));
    assert!(sources.contains(&"github".to_string()));
    assert!(sources.contains(&"arxiv".to_string()));
}

#[test]
fn threshold_filters_by_source_confidence() {
    // 0.8 keeps linkedin (0.9) and github (0.85), drops arxiv (0.7)
    let profile = FusionEngine::new()
        .with_min_confidence(0.8)
        .fuse(&[linkedin(), github(), arxiv()]);
    assert!(profile
        .projects
        .iter()
        .all(|p| p.source.source != "arxiv"));
}
