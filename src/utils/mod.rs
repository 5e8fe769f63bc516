//! This module aggregates various utility submodules used throughout the application.

/// Splitting long answers into Discord-sized fragments.
pub mod chunker;
/// Client for the OpenAI chat completions API.
pub mod openai_client;
