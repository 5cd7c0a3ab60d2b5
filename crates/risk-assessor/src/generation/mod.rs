//! Structured generation of risk-assessment items.
//!
//! - `backend`: capability boundary (`GenerationBackend`) plus request/response types
//! - `gemini`: HTTP implementation of the boundary
//! - `prompt`: versioned instruction template
//! - `schema`: response schema and strict decoder
//! - `client`: credential check, single call, failure classification
//! - `errors`: the five-kind failure taxonomy

pub mod backend;
pub mod client;
pub mod errors;
pub mod gemini;
pub mod prompt;
pub mod schema;

pub use backend::{BackendFailure, GenerationBackend, GenerationRequest, GenerationResponse};
pub use client::{GenerationClient, GENERATION_TEMPERATURE};
pub use errors::{GenerationError, Recovery};
