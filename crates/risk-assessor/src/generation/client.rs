//! Risk-assessment generation client.
//!
//! One call, one backend attempt. The client owns the configuration snapshot
//! and the backend handle, builds the instruction and response schema, and
//! folds every failure into a [`GenerationError`].

use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use regex::Regex;

use super::backend::{BackendFailure, GenerationBackend, GenerationRequest};
use super::errors::GenerationError;
use super::gemini::GeminiBackend;
use super::prompt::{build_risk_assessment_prompt, PROMPT_VERSION};
use super::schema::{decode_risk_items, risk_items_schema, STRUCTURED_RESPONSE_MIME_TYPE};
use crate::config::GenerationConfig;
use crate::domain::{ProjectOverview, RiskItem};

/// Sampling temperature for every assessment request.
pub const GENERATION_TEMPERATURE: f64 = 0.7;

static CREDENTIAL_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)api[ _-]?key|permission[ _-]?denied|unauthenticated")
        .expect("credential pattern is a valid regex")
});

/// Structured-generation client for risk assessments.
#[derive(Clone)]
pub struct GenerationClient {
    config: GenerationConfig,
    backend: Arc<dyn GenerationBackend>,
}

impl fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GenerationClient {
    pub fn new(config: GenerationConfig, backend: Arc<dyn GenerationBackend>) -> Self {
        Self { config, backend }
    }

    /// Client backed by the HTTP API at `config.base_url`.
    pub fn from_config(config: GenerationConfig) -> Self {
        let backend = Arc::new(GeminiBackend::new(config.base_url.clone()));
        Self::new(config, backend)
    }

    /// Generate the ordered risk items for `overview` and `work_types`.
    ///
    /// Fails with `Configuration` before touching the backend when no
    /// credential is configured. Otherwise makes exactly one backend call.
    pub async fn generate_risk_assessment(
        &self,
        overview: &ProjectOverview,
        work_types: &str,
    ) -> Result<Vec<RiskItem>, GenerationError> {
        let started = Instant::now();
        let result = self.generate_inner(overview, work_types).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(items) => tracing::info!(
                items = items.len(),
                model = %self.config.model,
                prompt_version = PROMPT_VERSION,
                elapsed_ms,
                "risk assessment generated"
            ),
            Err(err) => tracing::warn!(
                kind = err.kind(),
                recovery = %err.recovery(),
                elapsed_ms,
                error = %err,
                "risk assessment generation failed"
            ),
        }
        result
    }

    async fn generate_inner(
        &self,
        overview: &ProjectOverview,
        work_types: &str,
    ) -> Result<Vec<RiskItem>, GenerationError> {
        let api_key = self.config.api_key().ok_or_else(|| {
            GenerationError::Configuration("no API key configured".to_string())
        })?;

        let request = GenerationRequest {
            model: self.config.model.clone(),
            instruction: build_risk_assessment_prompt(overview, work_types),
            temperature: GENERATION_TEMPERATURE,
            response_mime_type: STRUCTURED_RESPONSE_MIME_TYPE.to_string(),
            response_schema: risk_items_schema(),
        };

        let response = self
            .backend
            .generate(&request, api_key)
            .await
            .map_err(|failure| classify_failure(&failure))?;

        let payload = response
            .text
            .filter(|text| !text.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        decode_risk_items(&payload).map_err(GenerationError::Decode)
    }
}

/// Credential rejections become `Auth`; everything else is `Backend`.
pub fn classify_failure(failure: &BackendFailure) -> GenerationError {
    let rejected_status = matches!(failure.status, Some(401) | Some(403));
    if rejected_status || CREDENTIAL_MESSAGE.is_match(&failure.message) {
        GenerationError::Auth(failure.to_string())
    } else {
        GenerationError::Backend(failure.message.clone())
    }
}
