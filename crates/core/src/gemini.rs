//! Gemini `generateContent` transport.
//!
//! Sends the analysis request with schema-constrained JSON output and
//! classifies failures from the HTTP status and the provider's error
//! envelope. No retries happen here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analyzer::{AnalysisRequest, ModelTransport};
use crate::{PitchlensError, Result, ServiceError};

/// Public Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Per-request timeout for model calls, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Transport for Google's Gemini REST API.
#[derive(Clone)]
pub struct GeminiTransport {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiTransport")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiTransport {
    /// Creates a transport for the public endpoint.
    ///
    /// The key is used as given; loading it is the caller's job.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| PitchlensError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, api_key))
    }

    /// Creates a transport around an existing HTTP client.
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self { client, api_key: api_key.into(), base_url: DEFAULT_BASE_URL.to_string() }
    }

    /// Points the transport at another endpoint (proxies, test servers).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

#[async_trait]
impl ModelTransport for GeminiTransport {
    async fn generate(&self, request: &AnalysisRequest) -> std::result::Result<String, ServiceError> {
        let body = GenerateContentBody {
            system_instruction: Content { role: None, parts: vec![Part { text: &request.system_instruction }] },
            contents: vec![Content { role: Some("user"), parts: vec![Part { text: &request.prompt }] }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.response_schema,
            },
        };

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(transport_message(&e)))?;

        let status = response.status().as_u16();
        let retry_after = parse_retry_after(response.headers());
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Transport(transport_message(&e)))?;

        if !(200..300).contains(&status) {
            let err = classify_error(status, &text, retry_after);
            tracing::debug!(status, error = %err, "Gemini returned an error");
            return Err(err);
        }

        extract_candidate_text(&text)
    }
}

/// Map a non-2xx Gemini response to a [`ServiceError`].
pub fn classify_error(status: u16, body: &str, retry_after: Option<Duration>) -> ServiceError {
    let (message, envelope_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => (env.error.message, env.error.status),
        Err(_) => (body.trim().chars().take(200).collect(), String::new()),
    };

    let message = if message.is_empty() { format!("HTTP {}", status) } else { message };

    match (status, envelope_status.as_str()) {
        (429, _) | (_, "RESOURCE_EXHAUSTED") => ServiceError::RateLimited { message, retry_after },
        (401 | 403, _) | (_, "UNAUTHENTICATED" | "PERMISSION_DENIED") => ServiceError::Auth(message),
        (400, "INVALID_ARGUMENT") if message.contains("API key") => ServiceError::Auth(message),
        (500..=599, _) | (_, "INTERNAL" | "UNAVAILABLE" | "DEADLINE_EXCEEDED") => {
            ServiceError::Server { status, message }
        }
        _ => ServiceError::BadRequest { status, message },
    }
}

/// Pull the answer text out of a successful `generateContent` response.
pub fn extract_candidate_text(body: &str) -> std::result::Result<String, ServiceError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::InvalidResponse(format!("unreadable generateContent response: {}", e)))?;

    if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ServiceError::InvalidResponse(format!("prompt blocked: {}", reason)));
    }

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::InvalidResponse("response has no candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(ServiceError::InvalidResponse(format!(
            "candidate has no text (finish reason: {})",
            reason
        )));
    }

    Ok(text)
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn transport_message(err: &reqwest::Error) -> String {
    if err.is_timeout() { format!("request timed out: {}", err) } else { err.to_string() }
}
