//! Google Gemini text correction backend.
//!
//! Sends one `generateContent` request per chapter. The API key is read from
//! the environment variable named in the correction config.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::pipeline::config::CorrectionConfig;

#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("API key not set. Set the {0} environment variable.")]
    MissingCredential(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("response was blocked: {0}")]
    Blocked(String),
    #[error("response contained no text")]
    EmptyResponse,
}

/// Turns a prompt into corrected text.
pub trait CorrectionService {
    fn correct(&self, prompt: &str) -> Result<String, CorrectionError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: u16,
    message: String,
}

/// Pulls the generated text out of a response body.
fn extract_text(response: GenerateResponse) -> Result<String, CorrectionError> {
    if let Some(error) = response.error {
        return Err(CorrectionError::Api {
            status: error.code,
            message: error.message,
        });
    }

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(CorrectionError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or(CorrectionError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
                Err(CorrectionError::Blocked(reason.to_string()))
            }
            _ => Err(CorrectionError::EmptyResponse),
        };
    }

    Ok(text)
}

pub struct GeminiClient {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(settings: &CorrectionConfig, api_key: String) -> Result<Self, CorrectionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!(
                "{}/models/{}:generateContent",
                settings.endpoint.trim_end_matches('/'),
                settings.model
            ),
            api_key,
        })
    }

    /// Builds a client with the key from `settings.api_key_env`. An unset or
    /// empty variable is a `MissingCredential` error.
    pub fn from_env(settings: &CorrectionConfig) -> Result<Self, CorrectionError> {
        let key = read_api_key(&settings.api_key_env)?;
        Self::new(settings, key)
    }
}

fn read_api_key(var: &str) -> Result<String, CorrectionError> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(CorrectionError::MissingCredential(var.to_string())),
    }
}

impl CorrectionService for GeminiClient {
    fn correct(&self, prompt: &str) -> Result<String, CorrectionError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            // error bodies are JSON with an "error" object; fall back to raw text
            let message = serde_json::from_str::<GenerateResponse>(&body)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(CorrectionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        extract_text(response.json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<String, CorrectionError> {
        extract_text(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_text_parts_are_joined() {
        let text = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world."}],"role":"model"},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(text, "Hello world.");
    }

    #[test]
    fn test_blocked_prompt() {
        let err = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap_err();
        assert!(matches!(err, CorrectionError::Blocked(reason) if reason == "SAFETY"));
    }

    #[test]
    fn test_blocked_candidate_without_text() {
        let err = parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap_err();
        assert!(matches!(err, CorrectionError::Blocked(_)));
    }

    #[test]
    fn test_empty_candidates() {
        assert!(matches!(
            parse(r#"{"candidates":[]}"#).unwrap_err(),
            CorrectionError::EmptyResponse
        ));
        assert!(matches!(
            parse(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]},"finishReason":"STOP"}]}"#)
                .unwrap_err(),
            CorrectionError::EmptyResponse
        ));
    }

    #[test]
    fn test_api_error_body() {
        let err = parse(r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#)
            .unwrap_err();
        assert!(matches!(err, CorrectionError::Api { status: 400, .. }));
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "fix this" }],
            }],
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"contents":[{"parts":[{"text":"fix this"}]}]}"#
        );
    }

    #[test]
    fn test_unset_key_is_missing_credential() {
        let err = read_api_key("BOOK_SCANNER_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(
            err,
            CorrectionError::MissingCredential(var) if var == "BOOK_SCANNER_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }
}
