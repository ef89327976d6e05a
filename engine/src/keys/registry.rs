//! Provider registry
//!
//! Holds at most one `KeyPool` per provider and a priority list that is
//! fixed at construction. Fallback to another provider only happens when
//! the preferred provider has no pool at all; running out of keys inside a
//! provider is never reported here (callers see `None` or an empty list).

use std::collections::HashMap;

use sdk::errors::EngineError;
use sdk::types::ProviderHealth;
use tracing::{info, warn};

use super::{ApiKey, KeyPool, Provider};
use crate::config::AIConfig;

pub struct ProviderRegistry {
    pools: HashMap<Provider, KeyPool>,
    priority: Vec<Provider>,
}

impl ProviderRegistry {
    /// Create an empty registry with the given fallback priority
    pub fn new(priority: Vec<Provider>) -> Self {
        Self {
            pools: HashMap::new(),
            priority,
        }
    }

    /// Build the registry from configuration.
    ///
    /// A provider configured without keys is skipped with a warning; it is
    /// simply not selectable.
    pub fn from_config(config: &AIConfig) -> Self {
        let mut registry = Self::new(config.priority.clone());

        for (provider, provider_config) in config.providers() {
            match registry.add_provider(provider, provider_config.keys.clone()) {
                Ok(()) => info!(
                    "Loaded {} API key(s) for {}",
                    provider_config.keys.len(),
                    provider
                ),
                Err(e) => warn!("{}", e),
            }
        }

        if registry.pools.is_empty() {
            warn!("No AI API keys configured!");
        }

        registry
    }

    /// Register the keys of one provider, replacing any previous pool
    pub fn add_provider(&mut self, provider: Provider, keys: Vec<ApiKey>) -> Result<(), EngineError> {
        let pool = KeyPool::new(provider, keys)?;
        self.pools.insert(provider, pool);
        Ok(())
    }

    /// Next key for `preferred`, or for the first provider in priority order
    /// that has keys. `None` only when no provider has any key.
    pub fn key_with_fallback(&self, preferred: Provider) -> Option<(ApiKey, Provider)> {
        if let Some(pool) = self.pools.get(&preferred) {
            return Some((pool.next(), preferred));
        }

        self.priority
            .iter()
            .filter(|provider| **provider != preferred)
            .find_map(|provider| {
                self.pools
                    .get(provider)
                    .map(|pool| (pool.next(), *provider))
            })
    }

    /// All keys of `provider` not marked failed (empty if unknown)
    pub fn available_keys(&self, provider: Provider) -> Vec<ApiKey> {
        self.pools
            .get(&provider)
            .map(KeyPool::available)
            .unwrap_or_default()
    }

    pub fn mark_failed(&self, provider: Provider, key: &ApiKey) -> bool {
        self.pools
            .get(&provider)
            .map(|pool| pool.mark_failed(key))
            .unwrap_or(false)
    }

    /// Clear the failed set of every pool
    pub fn reset_all_failed(&self) {
        for pool in self.pools.values() {
            pool.reset_failed();
        }
    }

    pub fn has_provider(&self, provider: Provider) -> bool {
        self.pools.contains_key(&provider)
    }

    pub fn priority(&self) -> &[Provider] {
        &self.priority
    }

    /// Providers with keys: priority order first, then any others
    pub fn providers(&self) -> Vec<Provider> {
        let mut ordered: Vec<Provider> = self
            .priority
            .iter()
            .copied()
            .filter(|p| self.pools.contains_key(p))
            .collect();

        for provider in Provider::DEFAULT_PRIORITY {
            if self.pools.contains_key(&provider) && !ordered.contains(&provider) {
                ordered.push(provider);
            }
        }
        ordered
    }

    /// Key counts per provider, safe to expose
    pub fn status(&self) -> Vec<ProviderHealth> {
        self.status_with(|_| None)
    }

    /// Key counts per provider, each tagged with the model `model_of` names
    pub fn status_with(
        &self,
        model_of: impl Fn(Provider) -> Option<String>,
    ) -> Vec<ProviderHealth> {
        self.providers()
            .into_iter()
            .filter_map(|provider| {
                self.pools.get(&provider).map(|pool| ProviderHealth {
                    provider: provider.to_string(),
                    keys: pool.len(),
                    available_keys: pool.available_count(),
                    model: model_of(provider),
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.status())
            .field("priority", &self.priority)
            .finish()
    }
}
