//! Saved-report naming and file output.

use dossier::report::{render_report, sanitize_filename, save_report};
use dossier::types::{CostSummary, SourceTag, UnifiedProfile, WorkEntry};
use dossier::utils::persona::Persona;
use rstest::rstest;

fn sample_profile() -> UnifiedProfile {
    UnifiedProfile {
        name: Some("Jane Smith".to_string()),
        headline: None,
        work_history: vec![WorkEntry {
            title: "Staff Engineer".to_string(),
            company: "Initech".to_string(),
            date_range: None,
            source: SourceTag {
                source: "linkedin".to_string(),
                confidence: 0.9,
            },
        }],
        projects: vec![],
        skills: vec![],
        provenance: Default::default(),
    }
}

#[rstest]
#[case("Jane Smith", "Jane_Smith")]
#[case("J. Doe-Ray", "J__Doe_Ray")]
#[case("Áccents Keep", "Áccents_Keep")]
fn sanitization_cases(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(sanitize_filename(input), expected);
}

#[test]
fn generated_filename_carries_goal_and_persona() {
    let dir = tempfile::tempdir().unwrap();
    let report = render_report(
        "Jane Smith",
        &Persona::recruiter(),
        &sample_profile(),
        &CostSummary::default(),
        None,
    );

    let path = save_report(&report, "Jane Smith", &Persona::recruiter(), dir.path(), None).unwrap();

    let filename = path.file_name().unwrap().to_str().unwrap();
    assert!(filename.starts_with("Jane_Smith_recruiter_"));
    assert!(filename.ends_with(".md"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), report);
}

#[test]
fn explicit_path_overrides_generated_name() {
    let dir = tempfile::tempdir().unwrap();
    let explicit = dir.path().join("nested").join("jane.md");

    let path = save_report(
        "# report",
        "Jane Smith",
        &Persona::general(),
        dir.path(),
        Some(&explicit),
    )
    .unwrap();

    assert_eq!(path, explicit);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# report");
}
