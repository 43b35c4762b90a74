//! dossier - concurrent multi-source person-research engine.
//!
//! A research run flows through one pipeline: the [`planner`] turns a goal
//! and persona into task descriptors, the [`router`] assigns each one a
//! capability and normalized input, the [`executor`] fans the routed tasks
//! out concurrently (charging the [`ledger`] per attempt), the [`fusion`]
//! engine merges successful payloads into one deterministic profile, and
//! the [`report`] module renders and persists the final Markdown dossier.
//! The [`research`] coordinator wires it all together.

pub mod cli;
pub mod executor;
pub mod fusion;
pub mod ledger;
pub mod llm;
pub mod planner;
pub mod providers;
pub mod report;
pub mod research;
pub mod router;
pub mod types;
pub mod utils;

pub use fusion::FusionEngine;
pub use ledger::CostLedger;
pub use research::{ResearchCoordinator, ResearchOutcome, ResearchRequest};
pub use types::{AppError, Capability, Result, TaskResult, TaskStatus, UnifiedProfile};
