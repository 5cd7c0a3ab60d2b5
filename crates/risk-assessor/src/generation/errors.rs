//! Failure taxonomy for the structured-generation call.
//!
//! Every failure of `GenerationClient::generate_risk_assessment` is one of
//! five kinds. Callers can ask how to recover via `recovery()` without string
//! matching, and get the operator-facing text from `user_message()`.
//!
//! | Kind            | Recovery          |
//! |-----------------|-------------------|
//! | Configuration   | fix configuration |
//! | Auth            | fix configuration |
//! | EmptyResponse   | resubmit          |
//! | Decode          | resubmit          |
//! | Backend         | resubmit          |
//!
//! Nothing here retries. Resubmission is always an explicit operator action.

use std::fmt;

use thiserror::Error;

/// Shown when the backend failed without saying why.
pub const GENERIC_FAILURE_MESSAGE: &str = "위험성 평가 생성 중 오류가 발생했습니다.";

/// How the operator gets past a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Correct the credential or settings, then resubmit.
    FixConfiguration,
    /// Resubmit the same inputs.
    Resubmit,
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixConfiguration => write!(f, "fix_configuration"),
            Self::Resubmit => write!(f, "resubmit"),
        }
    }
}

/// Unified error type for a single risk-assessment generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Credential missing at call time. Raised before any network call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The backend rejected the credential.
    #[error("Authentication rejected: {0}")]
    Auth(String),

    /// The backend answered without a textual payload.
    #[error("Empty response from generation backend")]
    EmptyResponse,

    /// The payload did not match the declared response schema.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Any other transport or backend failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl GenerationError {
    pub fn recovery(&self) -> Recovery {
        match self {
            Self::Configuration(_) | Self::Auth(_) => Recovery::FixConfiguration,
            Self::EmptyResponse | Self::Decode(_) | Self::Backend(_) => Recovery::Resubmit,
        }
    }

    /// Short machine-readable kind, used as a tracing field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Auth(_) => "auth",
            Self::EmptyResponse => "empty_response",
            Self::Decode(_) => "decode",
            Self::Backend(_) => "backend",
        }
    }

    /// The single message the wizard surfaces to the operator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => {
                "API Key가 설정되지 않았습니다. 환경 변수 API_KEY를 확인해주세요.".to_string()
            }
            Self::Auth(_) => "API Key 관련 설정 오류가 발생했습니다.".to_string(),
            Self::EmptyResponse => "AI로부터 유효한 응답을 받지 못했습니다.".to_string(),
            Self::Decode(detail) => {
                format!("AI 응답이 위험성평가표 형식과 일치하지 않습니다: {detail}")
            }
            Self::Backend(message) if message.trim().is_empty() => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            Self::Backend(message) => message.clone(),
        }
    }
}
