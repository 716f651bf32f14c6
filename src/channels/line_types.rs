//! LINE Messaging API wire types.
//!
//! Inbound webhook events are decoded into an exhaustive tagged union;
//! anything the relay does not act on lands in an `Unsupported` / `Other`
//! variant instead of failing the batch.

use serde::{Deserialize, Serialize};

// ── Inbound ─────────────────────────────────────────────────────────

/// Body of one webhook delivery.
///
/// Events are kept as raw JSON here so that one undecodable event does not
/// reject its siblings; see [`WebhookEvent::from_value`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
}

/// One inbound webhook event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum WebhookEvent {
    Message {
        reply_token: String,
        #[serde(default)]
        source: Source,
        message: MessageContent,
    },
    Postback {
        reply_token: String,
        #[serde(default)]
        source: Source,
        postback: Postback,
    },
    /// follow, unfollow, join, memberJoined, ...
    #[serde(other)]
    Unsupported,
}

impl WebhookEvent {
    /// Decode a single event object.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::Postback { .. } => "postback",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Where an event came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Content of a `message` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Text { text: String },
    /// image, sticker, audio, location, ...
    #[serde(other)]
    Other,
}

/// Payload of a `postback` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Postback {
    pub data: String,
}

// ── Outbound ────────────────────────────────────────────────────────

/// A message sent back through the reply endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Message {
    Text { text: String },
    Template { alt_text: String, template: Template },
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    #[cfg(test)]
    pub fn is_template(&self) -> bool {
        matches!(self, Self::Template { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Template {
    Buttons { text: String, actions: Vec<Action> },
}

/// A button on a template message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Action {
    Postback {
        label: String,
        data: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input_option: Option<InputOption>,
    },
    Clipboard {
        label: String,
        clipboard_text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputOption {
    OpenKeyboard,
}

/// `POST /v2/bot/message/reply` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub reply_token: String,
    pub messages: Vec<Message>,
}

/// `POST /v2/bot/chat/loading/start` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingRequest {
    pub chat_id: String,
    pub loading_seconds: u32,
}
