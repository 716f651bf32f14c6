//! Event classifier and conversation flows.
//!
//! Every inbound event maps to exactly one [`Route`]. The only state carried
//! between turns is the routing token on the button the user pressed.
//!
//! Routes, first match wins:
//! 1. text equal (after trim) to a register label → completion flow, with the
//!    raw text as the routing payload
//! 2. any other text → picker flow on the normalized text
//! 3. postback decoded by [`RoutingToken::parse`]:
//!    `next_message` → prompt for the next message,
//!    `change_<text>` → picker flow on `<text>`,
//!    `<register>_<text>` → completion flow,
//!    anything else → dropped as malformed
//! 4. everything else → ignored

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::channels::ReplyChannel;
use crate::channels::line_types::{MessageContent, WebhookEvent};
use crate::error::PipelineError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

use super::messages;
use super::prompts::PromptTable;
use super::routing::{Register, RoutingError, RoutingToken, normalize_text, parse_conversion};

/// Default loading-indicator duration.
pub const DEFAULT_LOADING_SECONDS: u32 = 10;

/// What to do with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    /// Plain text that is exactly a register label. The label itself is the
    /// payload, which never parses as `<register>_<text>`, so the completion
    /// flow drops it as malformed.
    LabelReply { payload: &'a str },
    Picker { text: String },
    Repick { text: &'a str },
    PromptNext,
    Convert { register: Register, text: &'a str },
    Malformed { payload: &'a str, error: RoutingError },
    Ignore,
}

/// Decide the route for an event. Total over [`WebhookEvent`].
pub fn classify(event: &WebhookEvent) -> Route<'_> {
    match event {
        WebhookEvent::Message {
            message: MessageContent::Text { text },
            ..
        } => {
            if Register::from_label(text.trim()).is_some() {
                Route::LabelReply { payload: text }
            } else {
                Route::Picker {
                    text: normalize_text(text),
                }
            }
        }
        WebhookEvent::Message {
            message: MessageContent::Other,
            ..
        } => Route::Ignore,
        WebhookEvent::Postback { postback, .. } => match RoutingToken::parse(&postback.data) {
            Ok(RoutingToken::NextMessage) => Route::PromptNext,
            Ok(RoutingToken::Change { text }) => Route::Repick { text },
            Ok(RoutingToken::Convert { register, text }) => Route::Convert { register, text },
            Err(error) => Route::Malformed {
                payload: &postback.data,
                error,
            },
        },
        WebhookEvent::Unsupported => Route::Ignore,
    }
}

fn drop_malformed(payload: &str, error: &RoutingError) {
    warn!(%error, payload, "Dropping malformed routing payload");
}

/// Routes events to their flow and talks to the gateways.
pub struct EventDispatcher {
    channel: Arc<dyn ReplyChannel>,
    llm: Arc<dyn LlmProvider>,
    prompts: Arc<PromptTable>,
    loading_seconds: u32,
}

impl EventDispatcher {
    pub fn new(
        channel: Arc<dyn ReplyChannel>,
        llm: Arc<dyn LlmProvider>,
        prompts: Arc<PromptTable>,
    ) -> Self {
        Self {
            channel,
            llm,
            prompts,
            loading_seconds: DEFAULT_LOADING_SECONDS,
        }
    }

    pub fn with_loading_seconds(mut self, seconds: u32) -> Self {
        self.loading_seconds = seconds;
        self
    }

    /// Handle one event end to end.
    ///
    /// Conversion failures are reported to the user inside the flow; an `Err`
    /// here means even the reply could not be delivered.
    pub async fn dispatch(&self, event: &WebhookEvent) -> Result<(), PipelineError> {
        let (reply_token, source) = match event {
            WebhookEvent::Message {
                reply_token,
                source,
                ..
            }
            | WebhookEvent::Postback {
                reply_token,
                source,
                ..
            } => (reply_token.as_str(), source),
            WebhookEvent::Unsupported => {
                debug!("Ignoring unsupported event");
                return Ok(());
            }
        };

        let route = classify(event);
        debug!(kind = event.kind(), ?route, "Classified event");

        let user_id = source.user_id.as_deref();
        match route {
            Route::LabelReply { payload } => match parse_conversion(payload) {
                Ok((register, text)) => {
                    self.completion_flow(register, text, reply_token, user_id)
                        .await
                }
                Err(error) => {
                    drop_malformed(payload, &error);
                    Ok(())
                }
            },
            Route::Convert { register, text } => {
                self.completion_flow(register, text, reply_token, user_id)
                    .await
            }
            Route::Malformed { payload, error } => {
                drop_malformed(payload, &error);
                Ok(())
            }
            Route::Picker { text } => self.picker_flow(&text, reply_token).await,
            Route::Repick { text } => self.picker_flow(text, reply_token).await,
            Route::PromptNext => {
                self.channel
                    .reply(reply_token, vec![messages::next_message_prompt()])
                    .await?;
                Ok(())
            }
            Route::Ignore => Ok(()),
        }
    }

    async fn picker_flow(&self, text: &str, reply_token: &str) -> Result<(), PipelineError> {
        self.channel
            .reply(reply_token, vec![messages::register_picker(text)])
            .await?;
        Ok(())
    }

    async fn completion_flow(
        &self,
        register: Register,
        original_text: &str,
        reply_token: &str,
        user_id: Option<&str>,
    ) -> Result<(), PipelineError> {
        match user_id {
            Some(chat_id) => self.start_loading(chat_id).await,
            None => debug!("No user id on event source, skipping loading indicator"),
        }

        if let Err(e) = self.convert_and_reply(register, original_text, reply_token).await {
            error!(error = %e, %register, "Conversion failed");
            self.channel
                .reply(reply_token, vec![messages::error_message(&e.to_string())])
                .await?;
        }
        Ok(())
    }

    /// Best effort: failures are logged and otherwise ignored.
    async fn start_loading(&self, chat_id: &str) {
        if let Err(e) = self
            .channel
            .start_loading(chat_id, self.loading_seconds)
            .await
        {
            warn!(channel = self.channel.name(), error = %e, "Loading indicator failed");
        }
    }

    async fn convert_and_reply(
        &self,
        register: Register,
        original_text: &str,
        reply_token: &str,
    ) -> Result<(), PipelineError> {
        let user_prompt = self.prompts.user_prompt(register, original_text);
        debug!(%register, prompt = %user_prompt, "Requesting conversion");

        let request = CompletionRequest::new(vec![
            ChatMessage::system(self.prompts.system_instruction(register)),
            ChatMessage::user(user_prompt),
        ]);
        let response = self.llm.complete(request).await?;

        let generated = response
            .content
            .as_deref()
            .map(str::trim_end)
            .filter(|t| !t.is_empty());

        let Some(generated) = generated else {
            error!(
                model = self.llm.model_name(),
                finish_reason = ?response.finish_reason,
                "Completion response missing text"
            );
            self.channel
                .reply(reply_token, vec![messages::missing_text_error()])
                .await?;
            return Ok(());
        };

        info!(%register, chars = generated.chars().count(), "Conversion complete");
        self.channel
            .reply(
                reply_token,
                messages::conversion_reply(generated, original_text),
            )
            .await?;
        Ok(())
    }
}
