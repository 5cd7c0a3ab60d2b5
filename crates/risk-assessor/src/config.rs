//! Generation backend configuration.
//!
//! Resolved once at process start and handed to the generation client, so
//! nothing below `main` reads the environment.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (applied by `main`)
//! 2. Environment variables (`API_KEY`, then `GEMINI_API_KEY`; `RISK_MODEL`, `RISK_BASE_URL`)
//! 3. TOML config file passed with `--config`
//! 4. Built-in defaults

use std::env;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default model for multi-factor risk analysis.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
/// Default REST root for the generative language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Primary credential variable.
pub const ENV_API_KEY: &str = "API_KEY";
/// Fallback credential variable.
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
const ENV_MODEL: &str = "RISK_MODEL";
const ENV_BASE_URL: &str = "RISK_BASE_URL";

/// Settings for the structured-generation backend.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Backend credential. `None` means "not configured", which the client
    /// reports as a configuration error before any network call.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model identifier passed to the backend.
    pub model: String,
    /// Base URL of the REST API, without a trailing slash.
    pub base_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

// The credential never reaches logs.
impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GenerationConfig {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load from an optional TOML file, then overlay the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let mut config = Self::from_toml_file(path)?;
                config.apply_env();
                Ok(config)
            }
            None => Ok(Self::from_env()),
        }
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    fn apply_env(&mut self) {
        if let Some(key) = non_blank_var(ENV_API_KEY).or_else(|| non_blank_var(ENV_GEMINI_API_KEY))
        {
            self.api_key = Some(key);
        }
        if let Some(model) = non_blank_var(ENV_MODEL) {
            self.model = model;
        }
        if let Some(base_url) = non_blank_var(ENV_BASE_URL) {
            self.base_url = base_url;
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// The credential, treating empty or whitespace-only values as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Validate the non-secret settings; return an error string if invalid.
    ///
    /// A missing credential is not a validation failure here: it surfaces as
    /// a configuration error when an assessment is requested.
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must be non-empty".to_string());
        }
        if self.base_url.trim().is_empty() {
            return Err("base_url must be non-empty".to_string());
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "base_url must start with http:// or https://, got {}",
                self.base_url
            ));
        }
        Ok(())
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
