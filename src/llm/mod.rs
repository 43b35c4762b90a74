//! Text-generation collaborators.
//!
//! The planner and synthesizer only need plain completion, so the client
//! trait is trimmed to generation; provider selection happens at startup via
//! the [`Provider`] enum.

pub mod client;
pub mod ollama;
pub mod openai;

pub use client::{LLMClient, Provider};
