//! Configuration management
//!
//! This module handles loading, validation, and management of the Viva configuration.
//! Configuration is stored in TOML format at ~/.viva/config.toml and is read
//! once at process start; there is no hot reload.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, HTTP bind address, CORS origins
//! - **ai**: Default provider, generation defaults, deadlines, fallback
//!   priority, and per-provider endpoint/model settings
//! - **interview**: Question count limits and session expiry
//!
//! # API keys
//!
//! Keys may be listed under `[ai.<provider>] keys = [...]`, but are normally
//! supplied through the environment as comma-separated lists
//! (`OPENAI_API_KEYS`, `GEMINI_API_KEYS`, `ANTHROPIC_API_KEYS`). Keys are
//! never written back to disk.
//!
//! # Environment overrides
//!
//! `DEFAULT_AI_PROVIDER`, `AI_MODEL` (model of the default provider),
//! `AI_TEMPERATURE`, `AI_MAX_TOKENS` and `VIVA_BIND_ADDR` override the file.
//!
//! # Examples
//!
//! ```no_run
//! use viva_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::load_or_create()?;
//! config.apply_env_overrides()?;
//!
//! println!("Default provider: {}", config.ai.default_provider);
//! # Ok(())
//! # }
//! ```

use crate::keys::{ApiKey, Provider};
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core process settings
    #[serde(default)]
    pub core: CoreConfig,

    /// AI provider configuration
    pub ai: AIConfig,

    /// Interview limits
    #[serde(default)]
    pub interview: InterviewConfig,
}

/// Core process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Address the HTTP API listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

/// AI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIConfig {
    /// Provider asked first (openai, gemini, anthropic)
    #[serde(default = "default_provider")]
    pub default_provider: Provider,

    /// Sampling temperature used when a request does not set one
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token cap used when a request does not set one
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Deadline for a single provider call, in seconds
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// How often failed keys are put back into rotation, in seconds
    #[serde(default = "default_key_cooldown")]
    pub key_cooldown_secs: u64,

    /// Fallback order used when the preferred provider has no keys
    #[serde(default = "default_priority")]
    pub priority: Vec<Provider>,

    #[serde(default)]
    pub openai: ProviderConfig,

    #[serde(default)]
    pub gemini: ProviderConfig,

    #[serde(default)]
    pub anthropic: ProviderConfig,
}

/// Endpoint, model and keys of one provider.
///
/// Empty `base_url`/`model` are filled with the provider's defaults during
/// validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub model: String,

    #[serde(default, skip_serializing)]
    pub keys: Vec<ApiKey>,
}

/// Interview configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    /// Question count used when a start request omits it
    #[serde(default = "default_max_questions")]
    pub default_max_questions: u32,

    /// Largest question count a start request may ask for
    #[serde(default = "default_max_questions_limit")]
    pub max_questions_limit: u32,

    /// Completed sessions older than this are purged, in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Sessions not yet completed are purged after this long without
    /// activity, in seconds
    #[serde(default = "default_session_idle_ttl")]
    pub session_idle_ttl_secs: u64,

    /// Interval of the maintenance sweep, in seconds
    #[serde(default = "default_maintenance_interval")]
    pub maintenance_interval_secs: u64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_provider() -> Provider {
    Provider::OpenAI
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_call_timeout() -> u64 {
    30
}

fn default_key_cooldown() -> u64 {
    300
}

fn default_priority() -> Vec<Provider> {
    Provider::DEFAULT_PRIORITY.to_vec()
}

fn default_max_questions() -> u32 {
    5
}

fn default_max_questions_limit() -> u32 {
    20
}

fn default_session_ttl() -> u64 {
    24 * 60 * 60
}

fn default_session_idle_ttl() -> u64 {
    2 * 60 * 60
}

fn default_maintenance_interval() -> u64 {
    60
}

fn default_base_url(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAI => "https://api.openai.com/v1",
        Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        Provider::Anthropic => "https://api.anthropic.com/v1",
    }
}

fn default_model(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAI => "gpt-4o-mini",
        Provider::Gemini => "gemini-1.5-flash",
        Provider::Anthropic => "claude-3-5-sonnet-20241022",
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            bind_addr: default_bind_addr(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            default_max_questions: default_max_questions(),
            max_questions_limit: default_max_questions_limit(),
            session_ttl_secs: default_session_ttl(),
            session_idle_ttl_secs: default_session_idle_ttl(),
            maintenance_interval_secs: default_maintenance_interval(),
        }
    }
}

impl ProviderConfig {
    /// Defaults for `provider`, without keys
    pub fn for_provider(provider: Provider) -> Self {
        Self {
            base_url: default_base_url(provider).to_string(),
            model: default_model(provider).to_string(),
            keys: Vec::new(),
        }
    }

    fn fill_defaults(&mut self, provider: Provider) {
        if self.base_url.trim().is_empty() {
            self.base_url = default_base_url(provider).to_string();
        }
        if self.model.trim().is_empty() {
            self.model = default_model(provider).to_string();
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
    }
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            call_timeout_secs: default_call_timeout(),
            key_cooldown_secs: default_key_cooldown(),
            priority: default_priority(),
            openai: ProviderConfig::for_provider(Provider::OpenAI),
            gemini: ProviderConfig::for_provider(Provider::Gemini),
            anthropic: ProviderConfig::for_provider(Provider::Anthropic),
        }
    }
}

impl AIConfig {
    pub fn provider(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::OpenAI => &self.openai,
            Provider::Gemini => &self.gemini,
            Provider::Anthropic => &self.anthropic,
        }
    }

    pub fn provider_mut(&mut self, provider: Provider) -> &mut ProviderConfig {
        match provider {
            Provider::OpenAI => &mut self.openai,
            Provider::Gemini => &mut self.gemini,
            Provider::Anthropic => &mut self.anthropic,
        }
    }

    /// Every provider section, in the default priority order
    pub fn providers(&self) -> impl Iterator<Item = (Provider, &ProviderConfig)> {
        Provider::DEFAULT_PRIORITY
            .into_iter()
            .map(move |provider| (provider, self.provider(provider)))
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn key_cooldown(&self) -> Duration {
        Duration::from_secs(self.key_cooldown_secs)
    }
}

impl Config {
    /// Load configuration from the default location (~/.viva/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        Self::load_or_create_at(&Self::default_config_path()?)
    }

    /// Load `path`, writing a default configuration there first if it is
    /// missing
    pub fn load_or_create_at(path: &Path) -> Result<Self, EngineError> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            Self::create_default(path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default_config();
        config.validate_and_process()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.viva/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".viva").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig::default(),
            ai: AIConfig::default(),
            interview: InterviewConfig::default(),
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), EngineError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup, then re-validate
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let keyed_providers = [
            ("OPENAI_API_KEYS", Provider::OpenAI),
            ("GEMINI_API_KEYS", Provider::Gemini),
            ("ANTHROPIC_API_KEYS", Provider::Anthropic),
        ];
        for (var, provider) in keyed_providers {
            if let Some(raw) = lookup(var) {
                self.ai.provider_mut(provider).keys = ApiKey::parse_list(&raw);
            }
        }

        if let Some(raw) = lookup("DEFAULT_AI_PROVIDER") {
            self.ai.default_provider = raw.parse()?;
        }

        if let Some(model) = lookup("AI_MODEL").filter(|m| !m.trim().is_empty()) {
            let provider = self.ai.default_provider;
            self.ai.provider_mut(provider).model = model.trim().to_string();
        }

        if let Some(raw) = lookup("AI_TEMPERATURE") {
            self.ai.temperature = raw.trim().parse().map_err(|_| {
                EngineError::Config(format!("AI_TEMPERATURE is not a number: '{}'", raw))
            })?;
        }

        if let Some(raw) = lookup("AI_MAX_TOKENS") {
            self.ai.max_tokens = raw.trim().parse().map_err(|_| {
                EngineError::Config(format!("AI_MAX_TOKENS is not an integer: '{}'", raw))
            })?;
        }

        if let Some(addr) = lookup("VIVA_BIND_ADDR").filter(|a| !a.trim().is_empty()) {
            self.core.bind_addr = addr.trim().to_string();
        }

        self.validate_and_process()
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates the log level and numeric ranges
    /// - Rejects empty or duplicated priority lists
    /// - Fills provider endpoint/model defaults
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(EngineError::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.ai.max_tokens == 0 {
            return Err(EngineError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if self.ai.call_timeout_secs == 0 {
            return Err(EngineError::Config(
                "call_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.ai.priority.is_empty() {
            return Err(EngineError::Config(
                "priority must list at least one provider".to_string(),
            ));
        }
        for (i, provider) in self.ai.priority.iter().enumerate() {
            if self.ai.priority[..i].contains(provider) {
                return Err(EngineError::Config(format!(
                    "provider '{}' appears twice in priority",
                    provider
                )));
            }
        }

        for provider in Provider::DEFAULT_PRIORITY {
            self.ai.provider_mut(provider).fill_defaults(provider);
        }

        let interview = &self.interview;
        if interview.max_questions_limit == 0 {
            return Err(EngineError::Config(
                "max_questions_limit must be greater than 0".to_string(),
            ));
        }
        if interview.default_max_questions == 0
            || interview.default_max_questions > interview.max_questions_limit
        {
            return Err(EngineError::Config(format!(
                "default_max_questions must be between 1 and {}",
                interview.max_questions_limit
            )));
        }
        if interview.session_idle_ttl_secs == 0 {
            return Err(EngineError::Config(
                "session_idle_ttl_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
