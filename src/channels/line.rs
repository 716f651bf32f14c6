//! LINE channel: reply and loading-indicator calls against the Messaging API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::channels::ReplyChannel;
use crate::channels::line_types::{LoadingRequest, Message, ReplyRequest};
use crate::error::ChannelError;

/// LINE Messaging API client.
pub struct LineChannel {
    access_token: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl LineChannel {
    pub fn new(access_token: SecretString, api_base: impl Into<String>) -> Self {
        Self {
            access_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v2/bot/{path}", self.api_base)
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ChannelError> {
        self.client
            .post(self.api_url(path))
            .bearer_auth(self.access_token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: self.name().to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl ReplyChannel for LineChannel {
    fn name(&self) -> &str {
        "line"
    }

    /// The platform's response is not acted on: a non-success status is
    /// logged and otherwise ignored. Only transport failures are errors.
    async fn reply(&self, reply_token: &str, messages: Vec<Message>) -> Result<(), ChannelError> {
        let count = messages.len();
        let body = ReplyRequest {
            reply_token: reply_token.to_string(),
            messages,
        };

        let resp = self.post("message/reply", &body).await?;
        let status = resp.status();
        if status.is_success() {
            tracing::debug!(count, "LINE reply sent");
        } else {
            let err = resp.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %err, "LINE reply rejected");
        }
        Ok(())
    }

    async fn start_loading(&self, chat_id: &str, seconds: u32) -> Result<(), ChannelError> {
        let body = LoadingRequest {
            chat_id: chat_id.to_string(),
            loading_seconds: seconds,
        };

        let resp = self.post("chat/loading/start", &body).await?;
        if !resp.status().is_success() {
            return Err(ChannelError::SendFailed {
                name: self.name().to_string(),
                reason: format!("loading/start returned {}", resp.status()),
            });
        }
        Ok(())
    }
}
