//! Plan generation.
//!
//! The planner asks the text-generation collaborator for a short, ordered
//! task list tailored to the persona. Collaborator failure or an empty
//! answer degrades to a fixed fallback plan derived from the goal; the call
//! is never retried here.

use crate::llm::LLMClient;
use crate::types::TaskDescriptor;
use crate::utils::persona::Persona;

const PLANNING_SYSTEM_PROMPT: &str = "You are a research planner. You break a person-research goal \
into concrete, independent search and scraping tasks. Respond with one task per line, no \
numbering, no commentary.";

/// An ordered, non-empty task list for one research run.
#[derive(Debug, Clone)]
pub struct Plan {
    pub tasks: Vec<TaskDescriptor>,
    /// True when the fallback plan was substituted for collaborator output.
    pub degraded: bool,
}

/// Generates research plans from a goal and a persona.
pub struct Planner {
    llm: Box<dyn LLMClient>,
    max_tasks: usize,
}

impl Planner {
    pub fn new(llm: Box<dyn LLMClient>, max_tasks: usize) -> Self {
        Self { llm, max_tasks }
    }

    /// Produce a non-empty ordered plan. Never fails: a collaborator error
    /// or an unusable answer yields the degraded fallback plan instead.
    pub async fn plan(&self, goal: &str, persona: &Persona) -> Plan {
        let prompt = build_planning_prompt(goal, persona);

        match self.llm.generate_with_system(PLANNING_SYSTEM_PROMPT, &prompt).await {
            Ok(response) => {
                let lines = parse_plan_lines(&response, self.max_tasks);
                if lines.is_empty() {
                    tracing::warn!(goal, "collaborator returned an empty plan, degrading");
                    Plan {
                        tasks: fallback_tasks(goal),
                        degraded: true,
                    }
                } else {
                    tracing::info!(goal, tasks = lines.len(), "research plan generated");
                    Plan {
                        tasks: lines.into_iter().map(TaskDescriptor::new).collect(),
                        degraded: false,
                    }
                }
            }
            Err(e) => {
                tracing::warn!(goal, error = %e, "planning collaborator failed, degrading");
                Plan {
                    tasks: fallback_tasks(goal),
                    degraded: true,
                }
            }
        }
    }
}

fn build_planning_prompt(goal: &str, persona: &Persona) -> String {
    format!(
        "Research target: {goal}\n\
         Persona: {description}\n\
         Preferred data sources: {sources}\n\
         Useful query keywords: {keywords}\n\n\
         Produce 4 to 8 research tasks for this target, most important first. \
         One task per line.",
        goal = goal,
        description = persona.description,
        sources = persona.data_sources.join(", "),
        keywords = persona.query_keywords.join(", "),
    )
}

/// Split collaborator output into usable task lines: trimmed, non-empty,
/// list markers stripped.
fn parse_plan_lines(response: &str, max_tasks: usize) -> Vec<String> {
    response
        .lines()
        .map(|line| strip_list_marker(line).to_string())
        .filter(|line| !line.is_empty())
        .take(max_tasks)
        .collect()
}

/// Remove a leading `- `, `* `, or `N.`/`N)` list marker, and nothing more.
/// Digits that are part of the task text (a year, a version) stay.
fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(['-', '*']) {
        return rest.trim();
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if (1..=2).contains(&digits) {
        if let Some(rest) = line[digits..].strip_prefix(['.', ')']) {
            return rest.trim();
        }
    }

    line
}

/// Deterministic fallback plan. Identical across repeated calls for the
/// same goal.
fn fallback_tasks(goal: &str) -> Vec<TaskDescriptor> {
    vec![
        TaskDescriptor::new(format!("{} LinkedIn profile", goal)),
        TaskDescriptor::new(format!("{} GitHub profile", goal)),
        TaskDescriptor::new(format!("{} recent work history", goal)),
        TaskDescriptor::new(format!("{} notable projects or contributions", goal)),
    ]
}
