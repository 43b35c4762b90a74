//! Research personas.
//!
//! A persona shapes the whole run: which sources the planner favors, which
//! keywords it feeds the plan prompt, and which report sections the
//! renderer emits.

/// One research persona. All four are static; personas are never user-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    /// Stable key, used in saved-report filenames.
    pub key: &'static str,
    pub description: &'static str,
    pub data_sources: &'static [&'static str],
    pub report_sections: &'static [&'static str],
    pub query_keywords: &'static [&'static str],
}

impl Persona {
    /// Balanced, all-sources research.
    pub fn general() -> Self {
        Self {
            key: "general",
            description: "A general-purpose researcher building a rounded picture of the person",
            data_sources: &["linkedin", "github", "web", "arxiv"],
            report_sections: &[
                "introduction",
                "work_experience",
                "projects",
                "skills",
                "sources",
            ],
            query_keywords: &["profile", "background", "career", "projects"],
        }
    }

    /// Hiring-focused: employment history and demonstrable skills.
    pub fn recruiter() -> Self {
        Self {
            key: "recruiter",
            description: "A technical recruiter assessing employment history, skills, and seniority",
            data_sources: &["linkedin", "github"],
            report_sections: &["introduction", "work_experience", "skills", "sources"],
            query_keywords: &["resume", "experience", "skills", "employment history"],
        }
    }

    /// Diligence-focused: ventures, traction, track record.
    pub fn investor() -> Self {
        Self {
            key: "investor",
            description: "An investor performing diligence on ventures, traction, and track record",
            data_sources: &["web", "linkedin", "github"],
            report_sections: &["introduction", "work_experience", "projects", "sources"],
            query_keywords: &["founder", "startup", "funding", "venture", "company"],
        }
    }

    /// Collaboration-focused: technical work and public output.
    pub fn founder() -> Self {
        Self {
            key: "founder",
            description: "A founder evaluating a potential collaborator's technical work and public output",
            data_sources: &["github", "arxiv", "web"],
            report_sections: &["introduction", "projects", "skills", "sources"],
            query_keywords: &["open source", "publications", "talks", "side projects"],
        }
    }

    pub fn includes_section(&self, section: &str) -> bool {
        self.report_sections.contains(&section)
    }
}
