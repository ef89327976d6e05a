//! Text generation layer
//!
//! One `TextGenerator` per provider speaks that provider's HTTP dialect.
//! The `GenerationGateway` sits on top: it picks a provider and key from the
//! `ProviderRegistry`, sweeps the provider's keys until one call succeeds,
//! and turns exhaustion into a typed `EngineError`. The `ResponseParser`
//! pulls the structured turn out of whatever text came back.
//!
//! `LLMError` describes a single failed provider call. It is consumed by the
//! gateway and never crosses the service boundary.

use async_trait::async_trait;

use crate::keys::{ApiKey, Provider};

pub mod anthropic;
pub mod gateway;
pub mod gemini;
pub mod openai;
pub mod parser;

pub use gateway::GenerationGateway;
pub use parser::{ParsedTurn, ResponseParser};

/// Result type for single provider calls
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during one provider call
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl LLMError {
    /// Map a non-success HTTP status to the matching error
    pub(crate) fn from_status(provider: Provider, status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => LLMError::AuthenticationFailed(body),
            429 => LLMError::RateLimitExceeded,
            400 | 404 | 422 => LLMError::InvalidRequest(body),
            _ => LLMError::ProviderUnavailable(format!(
                "{} API error ({}): {}",
                provider, status, body
            )),
        }
    }
}

/// A text generation request, immutable for the duration of one call.
///
/// Unset fields fall back to the configured defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub provider: Option<Provider>,
    pub model: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Raw text produced by a successful call, and who produced it
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub text: String,
    pub provider: Provider,
    pub model: String,
}

/// Fully resolved parameters handed to a `TextGenerator`
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCall {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// One provider's text generation endpoint
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Which provider this generator talks to
    fn provider(&self) -> Provider;

    /// Run one completion with `key`, returning the generated text
    async fn generate(&self, key: &ApiKey, call: &ProviderCall) -> Result<String>;
}

/// Shared HTTP client for the provider adapters
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("viva/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
