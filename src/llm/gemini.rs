//! Google Gemini `generateContent` client.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::provider::{CompletionRequest, CompletionResponse, LlmProvider, Role};
use crate::error::LlmError;

const PROVIDER: &str = "Gemini";

/// Gemini client bound to a single `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: SecretString,
    url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: SecretString, url: impl Into<String>) -> Self {
        let url = url.into();
        let model = model_from_url(&url);
        Self {
            client: reqwest::Client::new(),
            api_key,
            url,
            model,
        }
    }

    fn translate_request(request: &CompletionRequest) -> GeminiRequest {
        // generateContent only knows "user" and "model" turns; the register
        // instruction is sent as a leading user turn.
        let contents = request
            .messages
            .iter()
            .map(|msg| GeminiContent {
                role: match msg.role {
                    Role::System | Role::User => "user".to_string(),
                },
                parts: vec![GeminiPart {
                    text: msg.content.clone(),
                }],
            })
            .collect();

        GeminiRequest { contents }
    }
}

/// `.../models/<model>:generateContent` -> `<model>`
fn model_from_url(url: &str) -> String {
    url.rsplit_once("/models/")
        .map(|(_, rest)| rest.split(':').next().unwrap_or(rest))
        .filter(|m| !m.is_empty())
        .unwrap_or("gemini")
        .to_string()
}

/// First candidate's first part, if it carries non-empty text.
fn extract_text(resp: GeminiResponse) -> CompletionResponse {
    let Some(candidate) = resp.candidates.into_iter().next() else {
        return CompletionResponse::default();
    };

    let content = candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.is_empty());

    CompletionResponse {
        content,
        finish_reason: candidate.finish_reason,
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = Self::translate_request(&request);

        let resp = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus {
                provider: PROVIDER.into(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GeminiResponse = resp.json().await.map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.into(),
            reason: e.to_string(),
        })?;

        Ok(extract_text(parsed))
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}
