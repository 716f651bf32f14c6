//! Polite Relay: a LINE webhook that rewrites messages into a chosen
//! politeness register with Gemini.

pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod webhook;
