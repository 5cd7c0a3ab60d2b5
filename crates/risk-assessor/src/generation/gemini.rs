//! HTTP implementation of `GenerationBackend` for the generative language API.
//!
//! `POST {base_url}/models/{model}:generateContent` with the credential in the
//! `x-goog-api-key` header. No request timeout is set: the wizard waits until
//! the backend answers or fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::backend::{BackendFailure, GenerationBackend, GenerationRequest, GenerationResponse};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfigBody<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigBody<'a> {
    temperature: f64,
    response_mime_type: &'a str,
    response_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Backend that talks to the generative language REST API.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
        api_key: &str,
    ) -> Result<GenerationResponse, BackendFailure> {
        let url = self.endpoint(&request.model);
        let body = request_body(request);

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendFailure::transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendFailure::new(Some(status.as_u16()), e.to_string()))?;

        tracing::debug!(
            status = status.as_u16(),
            response_bytes = text.len(),
            model = %request.model,
            "generateContent returned"
        );

        if !status.is_success() {
            return Err(failure_from_error_body(status.as_u16(), &text));
        }

        parse_reply(&text)
    }
}

fn request_body(request: &GenerationRequest) -> GenerateContentBody<'_> {
    GenerateContentBody {
        contents: vec![Content {
            role: "user",
            parts: vec![Part {
                text: &request.instruction,
            }],
        }],
        generation_config: GenerationConfigBody {
            temperature: request.temperature,
            response_mime_type: &request.response_mime_type,
            response_schema: &request.response_schema,
        },
    }
}

/// Turn a successful reply into the first candidate's concatenated text.
fn parse_reply(text: &str) -> Result<GenerationResponse, BackendFailure> {
    let reply: GenerateContentReply = serde_json::from_str(text)
        .map_err(|e| BackendFailure::transport(format!("unreadable generateContent reply: {e}")))?;

    let Some(candidate) = reply.candidates.into_iter().next() else {
        let block_reason = reply.prompt_feedback.and_then(|feedback| feedback.block_reason);
        return Ok(GenerationResponse {
            text: None,
            finish_reason: block_reason,
        });
    };

    let joined: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    Ok(GenerationResponse {
        text: (!joined.is_empty()).then_some(joined),
        finish_reason: candidate.finish_reason,
    })
}

/// Map a non-2xx body (`{"error": {"code", "message", "status"}}`) to a failure.
fn failure_from_error_body(status: u16, body: &str) -> BackendFailure {
    match serde_json::from_str::<ErrorReply>(body) {
        Ok(reply) => {
            let message = match reply.error.status {
                Some(code) if !reply.error.message.is_empty() => {
                    format!("{} ({code})", reply.error.message)
                }
                Some(code) => code,
                None => reply.error.message,
            };
            BackendFailure::new(Some(status), message)
        }
        Err(_) => BackendFailure::new(Some(status), body.trim()),
    }
}
