//! Chat-platform I/O.

pub mod channel;
pub mod line;
pub mod line_types;

pub use channel::ReplyChannel;
pub use line::LineChannel;
