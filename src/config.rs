//! Configuration types.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Gemini endpoint used for completions.
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent";

/// Default LINE Messaging API base URL.
pub const DEFAULT_LINE_API_BASE: &str = "https://api.line.me";

/// Relay configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// LINE channel access token (bearer).
    pub channel_access_token: SecretString,
    /// Gemini API key.
    pub gemini_api_key: SecretString,
    /// Port the webhook listener binds to.
    pub port: u16,
    /// Base URL for the LINE Messaging API.
    pub line_api_base: String,
    /// Full `generateContent` URL for Gemini.
    pub gemini_api_url: String,
    /// Duration of the loading indicator shown while a completion runs.
    pub loading_seconds: u32,
}

impl RelayConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<SecretString, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from)
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let channel_access_token = required("CHANNEL_ACCESS_TOKEN")?;
        let gemini_api_key = required("GEMINI_API_KEY")?;

        let port = parse_or(&lookup, "RELAY_PORT", 8787u16)?;

        let loading_seconds = parse_or(&lookup, "RELAY_LOADING_SECONDS", 10u32)?;
        if !(5..=60).contains(&loading_seconds) || loading_seconds % 5 != 0 {
            return Err(ConfigError::InvalidValue {
                key: "RELAY_LOADING_SECONDS".into(),
                message: format!("{loading_seconds} is not a multiple of 5 between 5 and 60"),
            });
        }

        let line_api_base = lookup("LINE_API_BASE")
            .unwrap_or_else(|| DEFAULT_LINE_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let gemini_api_url =
            lookup("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string());

        Ok(Self {
            channel_access_token,
            gemini_api_key,
            port,
            line_api_base,
            gemini_api_url,
            loading_seconds,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}
