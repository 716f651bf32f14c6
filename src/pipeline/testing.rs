//! In-process gateway stubs for pipeline tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::channels::ReplyChannel;
use crate::channels::line_types::Message;
use crate::error::{ChannelError, LlmError};
use crate::llm::{CompletionRequest, CompletionResponse, LlmProvider};
use crate::pipeline::dispatcher::EventDispatcher;
use crate::pipeline::prompts::PromptTable;

/// Records every reply and loading call. Failing calls are recorded too.
#[derive(Default)]
pub struct RecordingChannel {
    replies: Mutex<Vec<(String, Vec<Message>)>>,
    loadings: Mutex<Vec<(String, u32)>>,
    fail_replies_for: Option<String>,
    fail_loading: bool,
}

impl RecordingChannel {
    pub fn failing_replies_for(mut self, reply_token: &str) -> Self {
        self.fail_replies_for = Some(reply_token.to_string());
        self
    }

    pub fn failing_loading(mut self) -> Self {
        self.fail_loading = true;
        self
    }

    pub async fn replies(&self) -> Vec<(String, Vec<Message>)> {
        self.replies.lock().await.clone()
    }

    pub async fn loadings(&self) -> Vec<(String, u32)> {
        self.loadings.lock().await.clone()
    }
}

#[async_trait]
impl ReplyChannel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn reply(&self, reply_token: &str, messages: Vec<Message>) -> Result<(), ChannelError> {
        self.replies
            .lock()
            .await
            .push((reply_token.to_string(), messages));
        if self.fail_replies_for.as_deref() == Some(reply_token) {
            return Err(ChannelError::SendFailed {
                name: self.name().to_string(),
                reason: "connection reset".into(),
            });
        }
        Ok(())
    }

    async fn start_loading(&self, chat_id: &str, seconds: u32) -> Result<(), ChannelError> {
        self.loadings
            .lock()
            .await
            .push((chat_id.to_string(), seconds));
        if self.fail_loading {
            return Err(ChannelError::SendFailed {
                name: self.name().to_string(),
                reason: "loading rejected".into(),
            });
        }
        Ok(())
    }
}

/// How [`StubLlm`] answers.
#[derive(Debug, Clone)]
pub enum LlmBehavior {
    Reply(String),
    Missing,
    Status(u16, String),
}

pub struct StubLlm {
    behavior: LlmBehavior,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubLlm {
    pub fn new(behavior: LlmBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().await.push(request);
        match &self.behavior {
            LlmBehavior::Reply(text) => Ok(CompletionResponse {
                content: Some(text.clone()),
                finish_reason: Some("STOP".into()),
            }),
            LlmBehavior::Missing => Ok(CompletionResponse::default()),
            LlmBehavior::Status(status, body) => Err(LlmError::HttpStatus {
                provider: "Gemini".into(),
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

/// Dispatcher wired to fresh stubs.
pub fn dispatcher_with(
    behavior: LlmBehavior,
) -> (EventDispatcher, Arc<RecordingChannel>, Arc<StubLlm>) {
    let channel = Arc::new(RecordingChannel::default());
    let llm = Arc::new(StubLlm::new(behavior));
    let dispatcher = EventDispatcher::new(
        channel.clone(),
        llm.clone(),
        Arc::new(PromptTable::builtin()),
    );
    (dispatcher, channel, llm)
}
