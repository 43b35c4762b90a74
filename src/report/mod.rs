//! Report rendering, narrative synthesis, and persistence.
//!
//! The renderer produces the Markdown dossier from the fused profile alone;
//! it never touches the network. Narrative insights come from the synthesis
//! collaborator and are strictly optional: a failed call degrades to the
//! structured dump, never to a failed run.

use crate::llm::LLMClient;
use crate::types::{CostSummary, Result, UnifiedProfile};
use crate::utils::persona::Persona;
use chrono::Local;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SYNTHESIS_SYSTEM_PROMPT: &str = "You are a research analyst. Given structured findings about \
a person, write a short narrative assessment (2-3 paragraphs) tailored to the reader persona. \
Only use the findings provided; do not invent facts.";

/// Generates optional narrative insights from the fused profile.
pub struct Synthesizer {
    llm: Box<dyn LLMClient>,
}

impl Synthesizer {
    pub fn new(llm: Box<dyn LLMClient>) -> Self {
        Self { llm }
    }

    /// Narrative insights, or `None` when the collaborator fails or the
    /// profile is empty. Never an error: the structured report stands alone.
    pub async fn synthesize(
        &self,
        goal: &str,
        persona: &Persona,
        profile: &UnifiedProfile,
    ) -> Option<String> {
        if profile.is_empty() {
            return None;
        }

        let prompt = format!(
            "Reader persona: {}\nResearch target: {}\n\nFindings:\n{}",
            persona.description,
            goal,
            profile_summary(profile)
        );

        match self.llm.generate_with_system(SYNTHESIS_SYSTEM_PROMPT, &prompt).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                tracing::warn!(goal, "synthesis returned empty text, omitting insights");
                None
            }
            Err(e) => {
                tracing::warn!(goal, error = %e, "synthesis failed, omitting insights");
                None
            }
        }
    }
}

/// Compact plain-text digest of the profile, used as collaborator input.
pub fn profile_summary(profile: &UnifiedProfile) -> String {
    let mut lines = Vec::new();

    if let Some(name) = &profile.name {
        lines.push(format!("Name: {}", name));
    }
    if let Some(headline) = &profile.headline {
        lines.push(format!("Headline: {}", headline));
    }
    for work in &profile.work_history {
        let dates = work.date_range.as_deref().unwrap_or("dates unknown");
        lines.push(format!("Role: {} at {} ({})", work.title, work.company, dates));
    }
    for project in &profile.projects {
        let description = project.description.as_deref().unwrap_or("no description");
        lines.push(format!("Project: {} - {}", project.name, description));
    }
    if !profile.skills.is_empty() {
        let names: Vec<&str> = profile.skills.iter().map(|s| s.name.as_str()).collect();
        lines.push(format!("Skills: {}", names.join(", ")));
    }

    lines.join("\n")
}

/// Render the full Markdown report. Sections follow the persona's list;
/// cost summary and sources are always present.
pub fn render_report(
    goal: &str,
    persona: &Persona,
    profile: &UnifiedProfile,
    costs: &CostSummary,
    insights: Option<&str>,
) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Research Report: {}\n\n", goal));
    out.push_str(&format!(
        "*Generated on {} for the {} persona.*\n\n",
        Local::now().format("%Y-%m-%d %H:%M"),
        persona.key
    ));

    if profile.is_empty() {
        out.push_str("No data could be collected for this person. ");
        out.push_str("All research tasks failed, timed out, or returned nothing usable.\n\n");
        render_costs(&mut out, costs);
        return out;
    }

    if persona.includes_section("introduction") {
        out.push_str("## Introduction\n\n");
        let name = profile.name.as_deref().unwrap_or(goal);
        match &profile.headline {
            Some(headline) => out.push_str(&format!("**{}** — {}\n\n", name, headline)),
            None => out.push_str(&format!("**{}**\n\n", name)),
        }
    }

    if persona.includes_section("work_experience") && !profile.work_history.is_empty() {
        out.push_str("## Work Experience\n\n");
        for work in &profile.work_history {
            let dates = work
                .date_range
                .as_deref()
                .map(|d| format!(" ({})", d))
                .unwrap_or_default();
            out.push_str(&format!(
                "- **{}**, {}{} *(source: {})*\n",
                work.title, work.company, dates, work.source.source
            ));
        }
        out.push('\n');
    }

    if persona.includes_section("projects") && !profile.projects.is_empty() {
        out.push_str("## Projects\n\n");
        let mut projects: Vec<_> = profile.projects.iter().collect();
        projects.sort_by(|a, b| b.stars.cmp(&a.stars).then(a.name.cmp(&b.name)));
        for project in projects {
            let stars = if project.stars > 0 {
                format!(" (\u{2605} {})", project.stars)
            } else {
                String::new()
            };
            let description = project
                .description
                .as_deref()
                .map(|d| format!(" — {}", d))
                .unwrap_or_default();
            match &project.url {
                Some(url) => out.push_str(&format!(
                    "- [{}]({}){}{}\n",
                    project.name, url, stars, description
                )),
                None => out.push_str(&format!("- {}{}{}\n", project.name, stars, description)),
            }
        }
        out.push('\n');
    }

    if persona.includes_section("skills") && !profile.skills.is_empty() {
        out.push_str("## Skills\n\n");
        let mut by_category: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for skill in &profile.skills {
            by_category
                .entry(skill.category.as_str())
                .or_default()
                .push(skill.name.as_str());
        }
        for (category, mut names) in by_category {
            names.sort();
            out.push_str(&format!("- **{}**: {}\n", category, names.join(", ")));
        }
        out.push('\n');
    }

    if let Some(insights) = insights {
        out.push_str("## Insights\n\n");
        out.push_str(insights);
        out.push_str("\n\n");
    }

    if persona.includes_section("sources") {
        out.push_str("## Sources\n\n");
        for source in profile.sources() {
            out.push_str(&format!("- {}\n", source));
        }
        out.push('\n');
    }

    render_costs(&mut out, costs);
    out
}

fn render_costs(out: &mut String, costs: &CostSummary) {
    out.push_str("## Research Cost\n\n");
    for (capability, usage) in &costs.per_capability {
        out.push_str(&format!(
            "- {}: {} call(s), ${:.3}\n",
            capability, usage.units, usage.cost
        ));
    }
    out.push_str(&format!("\n**Total: ${:.3}**\n", costs.total));
}

/// Replace every non-alphanumeric character with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Write the report to `<dir>/<sanitized-goal>_<persona>_<timestamp>.md` and
/// return the path. `explicit_path` overrides the generated name.
pub fn save_report(
    content: &str,
    goal: &str,
    persona: &Persona,
    output_dir: &Path,
    explicit_path: Option<&Path>,
) -> Result<PathBuf> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => {
            let filename = format!(
                "{}_{}_{}.md",
                sanitize_filename(goal),
                persona.key,
                Local::now().format("%Y%m%d_%H%M%S")
            );
            output_dir.join(filename)
        }
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&path, content)?;
    tracing::info!(path = %path.display(), "report saved");
    Ok(path)
}
