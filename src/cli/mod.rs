//! CLI surface for the dossier binary.
//!
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use crate::utils::persona::Persona;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// dossier - concurrent person-research engine
#[derive(Parser, Debug)]
#[command(
    name = "dossier",
    version,
    about = "Research a person across the public web and produce a Markdown dossier",
    long_about = "Plans research tasks with an LLM, fans them out across web search, \n\
                  code-hosting, professional-network, and academic providers, fuses the \n\
                  evidence into one profile, and renders a persona-tailored report.",
    after_help = "EXAMPLES:\n    \
                  dossier \"Jane Smith\"                          # General research\n    \
                  dossier \"Jane Smith\" --persona recruiter      # Hiring-focused report\n    \
                  dossier \"Jane Smith\" --github janesmith       # Skip handle discovery\n    \
                  dossier \"Jane Smith\" --output jane.md         # Explicit output path"
)]
pub struct Cli {
    /// Full name (or goal phrase) of the person to research
    pub goal: String,

    /// Research persona shaping plan and report
    #[arg(short, long, value_enum, default_value_t = PersonaArg::General)]
    pub persona: PersonaArg,

    /// Code-hosting username, bypassing discovery for that source
    #[arg(long)]
    pub github: Option<String>,

    /// Professional-network profile URL, bypassing discovery for that source
    #[arg(long)]
    pub linkedin: Option<String>,

    /// Write the report to this exact path instead of a generated name
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the report without saving it
    #[arg(long)]
    pub no_save: bool,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// The four fixed personas, as a clap value enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PersonaArg {
    General,
    Recruiter,
    Investor,
    Founder,
}

impl PersonaArg {
    pub fn persona(&self) -> Persona {
        match self {
            PersonaArg::General => Persona::general(),
            PersonaArg::Recruiter => Persona::recruiter(),
            PersonaArg::Investor => Persona::investor(),
            PersonaArg::Founder => Persona::founder(),
        }
    }
}
