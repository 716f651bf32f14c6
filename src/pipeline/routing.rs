//! Registers and the routing tokens carried on postback buttons.
//!
//! A routing token is the only conversation state: it rides on a button's
//! `data` and comes back verbatim in the next postback.
//!
//! Encodings:
//! - `<register>_<originalText>`: a register was picked
//! - `change_<originalText>`: re-pick a register for the same text
//! - `next_message`: start over
//!
//! Only the first `_` separates the keyword from the payload, so the original
//! text may itself contain `_`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Separator between keyword and payload.
pub const SEPARATOR: char = '_';
/// Prefix of the re-pick token.
pub const CHANGE_PREFIX: &str = "change_";
/// The start-over sentinel.
pub const NEXT_MESSAGE: &str = "next_message";

/// Target politeness register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Club,
    Circle,
    JobHunting,
    Adult,
}

impl Register {
    /// Picker order.
    pub const ALL: [Register; 4] = [
        Register::Club,
        Register::Circle,
        Register::JobHunting,
        Register::Adult,
    ];

    /// Keyword used in routing tokens.
    pub fn key(self) -> &'static str {
        match self {
            Register::Club => "club",
            Register::Circle => "circle",
            Register::JobHunting => "jobHunting",
            Register::Adult => "adult",
        }
    }

    /// Button label shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            Register::Club => "部活",
            Register::Circle => "サークル",
            Register::JobHunting => "就職活動",
            Register::Adult => "目上の大人",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.key() == key)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == label)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Why a `<register>_<originalText>` payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("empty routing payload")]
    Empty,

    #[error("routing payload has no separator: {0}")]
    MissingSeparator(String),

    #[error("unknown register: {0}")]
    UnknownRegister(String),

    #[error("routing payload has no text after register {0}")]
    MissingText(String),
}

/// A decoded routing token, borrowing its text from the postback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingToken<'a> {
    Convert { register: Register, text: &'a str },
    Change { text: &'a str },
    NextMessage,
}

impl<'a> RoutingToken<'a> {
    /// Decode any of the three encodings. `next_message` is checked before the
    /// `change_` prefix; the two never overlap.
    pub fn parse(data: &'a str) -> Result<Self, RoutingError> {
        if data == NEXT_MESSAGE {
            return Ok(Self::NextMessage);
        }
        if let Some(text) = data.strip_prefix(CHANGE_PREFIX) {
            return Ok(Self::Change { text });
        }
        let (register, text) = parse_conversion(data)?;
        Ok(Self::Convert { register, text })
    }
}

impl fmt::Display for RoutingToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Convert { register, text } => write!(f, "{}{SEPARATOR}{text}", register.key()),
            Self::Change { text } => write!(f, "{CHANGE_PREFIX}{text}"),
            Self::NextMessage => f.write_str(NEXT_MESSAGE),
        }
    }
}

/// Split `<register>_<originalText>` on the first separator.
pub fn parse_conversion(data: &str) -> Result<(Register, &str), RoutingError> {
    if data.is_empty() {
        return Err(RoutingError::Empty);
    }
    let (key, text) = data
        .split_once(SEPARATOR)
        .ok_or_else(|| RoutingError::MissingSeparator(data.to_string()))?;
    let register =
        Register::from_key(key).ok_or_else(|| RoutingError::UnknownRegister(key.to_string()))?;
    if text.is_empty() {
        return Err(RoutingError::MissingText(key.to_string()));
    }
    Ok((register, text))
}

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every whitespace run (newlines included) to one space and trim.
pub fn normalize_text(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}
