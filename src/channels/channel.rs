//! Outbound chat-platform seam.

use async_trait::async_trait;

use crate::channels::line_types::Message;
use crate::error::ChannelError;

/// Outbound half of a chat platform: replies and the typing indicator.
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    /// Channel name for logs and errors.
    fn name(&self) -> &str;

    /// Send one batch of messages against a reply token.
    async fn reply(&self, reply_token: &str, messages: Vec<Message>) -> Result<(), ChannelError>;

    /// Show a loading indicator in the user's chat for `seconds`.
    async fn start_loading(&self, chat_id: &str, seconds: u32) -> Result<(), ChannelError>;
}
