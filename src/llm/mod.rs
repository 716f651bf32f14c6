//! Completion providers.
//!
//! The relay talks to Google Gemini through [`GeminiClient`]; the rest of the
//! crate only sees the [`LlmProvider`] trait.

pub mod gemini;
pub mod provider;

pub use gemini::GeminiClient;
pub use provider::*;
