//! Generation gateway
//!
//! Resolves a provider and key through the `ProviderRegistry`, then tries
//! every available key of that provider once, starting at the key the
//! rotation handed out. Each attempt runs under the configured per-call
//! deadline. Per-key failures are logged and swallowed.
//!
//! Fallback happens at key selection only: once a provider is resolved, its
//! exhaustion fails the call even if another provider has working keys.

use std::collections::HashMap;
use std::sync::Arc;

use sdk::errors::EngineError;
use sdk::types::ProviderHealth;
use tracing::{debug, error, info, warn};

use super::anthropic::AnthropicGenerator;
use super::gemini::GeminiGenerator;
use super::openai::OpenAIGenerator;
use super::{GenerationRequest, GenerationResult, LLMError, ProviderCall, TextGenerator};
use crate::config::AIConfig;
use crate::keys::{ApiKey, Provider, ProviderRegistry};

pub struct GenerationGateway {
    registry: Arc<ProviderRegistry>,
    generators: HashMap<Provider, Arc<dyn TextGenerator>>,
    config: AIConfig,
}

impl GenerationGateway {
    /// Gateway without generators; register them with `with_generator`
    pub fn new(registry: Arc<ProviderRegistry>, config: AIConfig) -> Self {
        Self {
            registry,
            generators: HashMap::new(),
            config,
        }
    }

    /// Gateway with the HTTP generator of every provider, pointed at the
    /// configured base URLs
    pub fn from_config(registry: Arc<ProviderRegistry>, config: &AIConfig) -> Self {
        Self::new(registry, config.clone())
            .with_generator(Arc::new(OpenAIGenerator::new(&config.openai.base_url)))
            .with_generator(Arc::new(GeminiGenerator::new(&config.gemini.base_url)))
            .with_generator(Arc::new(AnthropicGenerator::new(&config.anthropic.base_url)))
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generators.insert(generator.provider(), generator);
        self
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn default_provider(&self) -> Provider {
        self.config.default_provider
    }

    /// Model used for `provider` when a request does not name one
    pub fn model_for(&self, provider: Provider) -> &str {
        &self.config.provider(provider).model
    }

    /// Registry status with each provider's configured model
    pub fn status(&self) -> Vec<ProviderHealth> {
        self.registry.status_with(|provider| Some(self.model_for(provider).to_string()))
    }

    /// Generate text for `request`.
    ///
    /// # Errors
    ///
    /// - `NoKeyAvailable` when no provider has any key
    /// - `AllKeysExhausted` when every available key of the resolved
    ///   provider failed (`attempts` may be 0 if all were already marked
    ///   failed)
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, EngineError> {
        let preferred = request.provider.unwrap_or(self.config.default_provider);
        let (chosen, provider) = self
            .registry
            .key_with_fallback(preferred)
            .ok_or(EngineError::NoKeyAvailable)?;

        if provider != preferred {
            info!("{} has no keys configured, falling back to {}", preferred, provider);
        }

        let call = self.resolve_call(request, preferred, provider);
        let keys = starting_at(self.registry.available_keys(provider), &chosen);

        let Some(generator) = self.generators.get(&provider) else {
            error!("No generator registered for {}", provider);
            return Err(EngineError::AllKeysExhausted {
                provider: provider.to_string(),
                attempts: 0,
            });
        };

        let timeout = self.config.call_timeout();
        let mut attempts = 0;

        for (position, key) in keys.iter().enumerate() {
            attempts += 1;
            debug!(
                "Calling {} ({}) with key {}/{}",
                provider,
                call.model,
                position + 1,
                keys.len()
            );

            match tokio::time::timeout(timeout, generator.generate(key, &call)).await {
                Ok(Ok(text)) => {
                    debug!("{} succeeded after {} attempt(s)", provider, attempts);
                    return Ok(GenerationResult {
                        text,
                        provider,
                        model: call.model,
                    });
                }
                Ok(Err(LLMError::AuthenticationFailed(_))) => {
                    warn!(
                        "{} rejected key {}/{}; marking it failed",
                        provider,
                        position + 1,
                        keys.len()
                    );
                    self.registry.mark_failed(provider, key);
                }
                Ok(Err(e)) => {
                    warn!("{} key {}/{} failed: {}", provider, position + 1, keys.len(), e);
                }
                Err(_) => {
                    warn!(
                        "{} key {}/{} timed out after {}s",
                        provider,
                        position + 1,
                        keys.len(),
                        timeout.as_secs()
                    );
                }
            }
        }

        error!("All {} API key(s) failed for {}", attempts, provider);
        Err(EngineError::AllKeysExhausted {
            provider: provider.to_string(),
            attempts,
        })
    }

    fn resolve_call(
        &self,
        request: &GenerationRequest,
        preferred: Provider,
        resolved: Provider,
    ) -> ProviderCall {
        let model = match &request.model {
            Some(model) if resolved == preferred && !model.trim().is_empty() => model.clone(),
            _ => self.config.provider(resolved).model.clone(),
        };

        ProviderCall {
            prompt: request.prompt.clone(),
            system_prompt: request.system_prompt.clone(),
            model,
            temperature: request.temperature.unwrap_or(self.config.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
        }
    }
}

/// Rotate `keys` so that `first` leads; unchanged if `first` is absent
fn starting_at(mut keys: Vec<ApiKey>, first: &ApiKey) -> Vec<ApiKey> {
    if let Some(index) = keys.iter().position(|k| k == first) {
        keys.rotate_left(index);
    }
    keys
}
