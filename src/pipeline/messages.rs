//! Outbound message builders.

use crate::channels::line_types::{Action, InputOption, Message, Template};

use super::routing::{Register, RoutingToken};

/// The platform's cap on buttons-template text.
pub const BUTTONS_TEXT_MAX_CHARS: usize = 160;
/// The platform's cap on a clipboard action's text.
pub const CLIPBOARD_TEXT_MAX_CHARS: usize = 1000;
/// The platform's cap on postback `data`.
pub const POSTBACK_DATA_MAX_CHARS: usize = 300;
/// The platform's cap on a text message.
pub const TEXT_MESSAGE_MAX_CHARS: usize = 5000;

pub const PICKER_ALT_TEXT: &str = "変換シーンを選択してください";
pub const PICKER_PROMPT: &str = "このメッセージをどのように丁寧にしますか？";
pub const RESULT_ALT_TEXT: &str = "変換されたテキストです";
pub const COPY_LABEL: &str = "コピー";
pub const RETRY_LABEL: &str = "他のシーンで変換";
pub const NEXT_LABEL: &str = "次のメッセージ";
pub const NEXT_MESSAGE_PROMPT: &str = "次のメッセージを入力してください。";
pub const MISSING_TEXT_ERROR: &str =
    "エラーが発生しました: Gemini APIからの応答にテキストが含まれていません。";

/// Four postback buttons, one per register, each carrying `<register>_<text>`.
pub fn register_picker(text: &str) -> Message {
    let actions = Register::ALL
        .into_iter()
        .map(|register| Action::Postback {
            label: register.label().to_string(),
            data: encode_token(RoutingToken::Convert { register, text }),
            input_option: None,
        })
        .collect();

    Message::Template {
        alt_text: PICKER_ALT_TEXT.to_string(),
        template: Template::Buttons {
            text: PICKER_PROMPT.to_string(),
            actions,
        },
    }
}

/// Copy / retry-with-another-register / next-message buttons under a result.
pub fn result_prompt(generated: &str, original_text: &str) -> Message {
    let actions = vec![
        Action::Clipboard {
            label: COPY_LABEL.to_string(),
            clipboard_text: truncate_chars(generated, CLIPBOARD_TEXT_MAX_CHARS),
        },
        Action::Postback {
            label: RETRY_LABEL.to_string(),
            data: encode_token(RoutingToken::Change {
                text: original_text,
            }),
            input_option: None,
        },
        Action::Postback {
            label: NEXT_LABEL.to_string(),
            data: encode_token(RoutingToken::NextMessage),
            input_option: Some(InputOption::OpenKeyboard),
        },
    ];

    Message::Template {
        alt_text: RESULT_ALT_TEXT.to_string(),
        template: Template::Buttons {
            text: truncate_chars(generated, BUTTONS_TEXT_MAX_CHARS),
            actions,
        },
    }
}

/// The generated text followed by its result prompt, sent as one reply.
pub fn conversion_reply(generated: &str, original_text: &str) -> Vec<Message> {
    vec![
        Message::text(truncate_chars(generated, TEXT_MESSAGE_MAX_CHARS)),
        result_prompt(generated, original_text),
    ]
}

pub fn next_message_prompt() -> Message {
    Message::text(NEXT_MESSAGE_PROMPT)
}

pub fn missing_text_error() -> Message {
    Message::text(MISSING_TEXT_ERROR)
}

/// User-facing text for a failed conversion.
pub fn error_message(description: &str) -> Message {
    Message::text(format!("エラーが発生しました: {description}"))
}

/// Encode a token for a button, cutting the tail of its text so the platform
/// accepts it. The keyword sits at the front, so a cut token still decodes.
fn encode_token(token: RoutingToken<'_>) -> String {
    let mut data = token.to_string();
    let cut = data.char_indices().nth(POSTBACK_DATA_MAX_CHARS).map(|(i, _)| i);
    if let Some(end) = cut {
        data.truncate(end);
    }
    data
}

/// Cut to at most `max` chars, ending in `…` when shortened.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
