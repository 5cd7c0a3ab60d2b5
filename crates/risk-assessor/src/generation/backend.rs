//! Capability boundary to the structured-content generation service.
//!
//! The client depends only on `GenerationBackend`, so the wizard and its tests
//! can swap the HTTP implementation for a deterministic fake.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

/// Everything the backend needs for one structured-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Model identifier.
    pub model: String,
    /// Natural-language instruction.
    pub instruction: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Forced response content type (structured, not free text).
    pub response_mime_type: String,
    /// Schema the response payload must conform to.
    pub response_schema: Value,
}

/// Raw backend answer before decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    /// Textual payload, `None` when the backend produced no candidate text.
    pub text: Option<String>,
    /// Why the backend stopped, when reported.
    pub finish_reason: Option<String>,
}

impl GenerationResponse {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            finish_reason: None,
        }
    }
}

/// A transport or backend-side failure, not yet classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    /// HTTP status, when the failure came from an HTTP response.
    pub status: Option<u16>,
    /// Message reported by the backend or the transport.
    pub message: String,
}

impl BackendFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for BackendFailure {}

/// One structured-generation call. Implementations make exactly one attempt.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
        api_key: &str,
    ) -> Result<GenerationResponse, BackendFailure>;
}
