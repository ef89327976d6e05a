//! API key management
//!
//! Keys are grouped per provider into a `KeyPool` (round-robin rotation plus
//! a set of temporarily failed keys). The `ProviderRegistry` holds one pool
//! per configured provider and a fixed priority order used for fallback when
//! the preferred provider has no keys at all.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use sdk::errors::EngineError;

pub mod pool;
pub mod registry;
pub mod secret;

pub use pool::KeyPool;
pub use registry::ProviderRegistry;
pub use secret::ApiKey;

/// External text-generation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Gemini,
    Anthropic,
}

impl Provider {
    /// Fallback order used when no priority is configured
    pub const DEFAULT_PRIORITY: [Provider; 3] =
        [Provider::OpenAI, Provider::Gemini, Provider::Anthropic];

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Gemini => "gemini",
            Provider::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Provider {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "gemini" => Ok(Provider::Gemini),
            "anthropic" => Ok(Provider::Anthropic),
            other => Err(EngineError::Config(format!(
                "Unknown provider '{}'. Must be one of: openai, gemini, anthropic",
                other
            ))),
        }
    }
}
