//! Conversation pipeline.
//!
//! Each webhook delivery flows through:
//! 1. `batch::handle_batch`: decode and fan out events concurrently
//! 2. `dispatcher::classify`: pick one of the fixed routes
//! 3. `EventDispatcher` flows: picker, next-message prompt, or completion
//!
//! No state survives a delivery; the routing token on each button carries
//! everything the next turn needs.

pub mod batch;
pub mod dispatcher;
pub mod messages;
pub mod prompts;
pub mod routing;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchSummary, handle_batch};
pub use dispatcher::{EventDispatcher, Route, classify};
pub use prompts::PromptTable;
pub use routing::{Register, RoutingToken};
