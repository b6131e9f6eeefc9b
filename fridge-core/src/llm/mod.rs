//! LLM provider abstraction for the inference gateway.
//!
//! The gateway endpoints render a prompt, hand it to an [`LlmProvider`], and
//! parse the text that comes back. [`GeminiProvider`] talks to Google's
//! Generative Language API; [`FakeProvider`] answers from canned responses.

mod fake;
mod gemini;

pub use fake::FakeProvider;
pub use gemini::GeminiProvider;

use async_trait::async_trait;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";

/// Error type for LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Trait for LLM providers.
///
/// Implementations should be stateless and thread-safe. The provider is responsible
/// for making API calls and returning the model's text response.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send a prompt and get the model's text response.
    ///
    /// `json_output` asks the provider to constrain the response to JSON
    /// where the API supports it.
    async fn complete(&self, prompt: &str, json_output: bool) -> Result<String, LlmError>;

    /// Provider name (e.g., "gemini", "fake").
    fn provider_name(&self) -> &'static str;

    fn model_name(&self) -> &str;
}

/// Which provider the server should use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmConfig {
    Gemini { api_key: String, model: String },
    Fake,
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// - `FRIDGE_LLM_PROVIDER`: "gemini" | "fake" (default: "gemini")
    /// - `GEMINI_API_KEY`: required for gemini
    /// - `FRIDGE_LLM_MODEL`: model name (default: "gemini-2.5-flash-lite")
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LlmError> {
        let provider = lookup("FRIDGE_LLM_PROVIDER").unwrap_or_else(|| "gemini".to_string());

        match provider.as_str() {
            "fake" => Ok(LlmConfig::Fake),
            "gemini" => {
                let api_key = lookup("GEMINI_API_KEY")
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| LlmError::NotConfigured("GEMINI_API_KEY not set".to_string()))?;
                let model = lookup("FRIDGE_LLM_MODEL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
                Ok(LlmConfig::Gemini { api_key, model })
            }
            other => Err(LlmError::NotConfigured(format!("Unknown provider: {other}"))),
        }
    }

    pub fn into_provider(self) -> Box<dyn LlmProvider> {
        match self {
            LlmConfig::Gemini { api_key, model } => Box::new(GeminiProvider::new(api_key, model)),
            LlmConfig::Fake => Box::new(FakeProvider::with_gateway_responses()),
        }
    }
}
