//! Error types and handling
//!
//! This module provides the error type used throughout the Viva engine and
//! carried across the service boundary. All errors implement the
//! `VivaErrorExt` trait which provides a stable machine code, a
//! user-friendly hint, a recoverability flag and an error class that
//! transports (HTTP, CLI) map onto their own status conventions.
//!
//! # Security
//!
//! Error messages never contain API keys. Exhaustion errors name the
//! provider only.

use thiserror::Error;

/// Broad category of an error, used by transports to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller sent something invalid
    Client,

    /// The referenced entity does not exist
    NotFound,

    /// The request is valid but conflicts with the current state
    Conflict,

    /// No provider capacity is available right now
    Unavailable,

    /// A provider answered, but not with anything usable
    Upstream,

    /// Configuration or local I/O problem
    Internal,
}

/// Trait for Viva error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait VivaErrorExt {
    /// Stable, machine-readable error code (e.g. `SESSION_NOT_FOUND`)
    fn code(&self) -> &'static str;

    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and never contains secrets.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors typically require a configuration change.
    fn is_recoverable(&self) -> bool;

    /// Category used to map the error onto a transport status
    fn class(&self) -> ErrorClass;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Key management**: empty pools, no key anywhere, every key failing
/// - **Generation output**: model text that cannot be parsed
/// - **Input validation**: unsupported language or experience level
/// - **Session lifecycle**: unknown session, illegal state transition
/// - **Configuration / IO**
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, ErrorClass, VivaErrorExt};
///
/// let error = EngineError::SessionNotFound("abc".to_string());
/// assert_eq!(error.code(), "SESSION_NOT_FOUND");
/// assert_eq!(error.class(), ErrorClass::NotFound);
///
/// let exhausted = EngineError::AllKeysExhausted {
///     provider: "openai".to_string(),
///     attempts: 2,
/// };
/// assert!(exhausted.to_string().contains("openai"));
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Key management errors
    #[error("No API keys configured for provider {provider}")]
    EmptyPool { provider: String },

    #[error("No API keys available for any provider")]
    NoKeyAvailable,

    #[error("All {attempts} API key(s) failed for provider {provider}")]
    AllKeysExhausted { provider: String, attempts: usize },

    // Generation output errors
    #[error("Malformed response from generation backend: {0}")]
    MalformedResponse(String),

    // Input validation errors
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Invalid experience level: {0}")]
    InvalidExperienceLevel(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Lookup errors
    #[error("Language not found: {0}")]
    LanguageNotFound(String),

    // Session lifecycle errors
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Cannot {action} while interview is {state}")]
    InvalidStateTransition { action: String, state: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Shorthand for a rejected state transition
    pub fn transition(action: impl Into<String>, state: impl ToString) -> Self {
        Self::InvalidStateTransition {
            action: action.into(),
            state: state.to_string(),
        }
    }
}

impl VivaErrorExt for EngineError {
    fn code(&self) -> &'static str {
        match self {
            Self::EmptyPool { .. } => "EMPTY_POOL",
            Self::NoKeyAvailable => "NO_KEY_AVAILABLE",
            Self::AllKeysExhausted { .. } => "ALL_KEYS_EXHAUSTED",
            Self::MalformedResponse(_) => "MALFORMED_RESPONSE",
            Self::UnsupportedLanguage(_) => "UNSUPPORTED_LANGUAGE",
            Self::InvalidExperienceLevel(_) => "INVALID_EXPERIENCE_LEVEL",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::LanguageNotFound(_) => "LANGUAGE_NOT_FOUND",
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    fn user_hint(&self) -> &str {
        match self {
            Self::EmptyPool { .. } => "Add at least one API key for this provider or remove it",
            Self::NoKeyAvailable => "Service unavailable. No AI provider is configured",
            Self::AllKeysExhausted { .. } => {
                "Service temporarily unavailable. Please try again shortly"
            }
            Self::MalformedResponse(_) => "The interviewer produced an unreadable reply. Retry",
            Self::UnsupportedLanguage(_) => "Pick one of the supported interview languages",
            Self::InvalidExperienceLevel(_) => "Use junior, mid or senior",
            Self::InvalidRequest(_) => "Check the request fields and try again",
            Self::LanguageNotFound(_) => "List the supported languages and use one of their codes",
            Self::SessionNotFound(_) => "Start a new interview session",
            Self::InvalidStateTransition { .. } => {
                "This action is not allowed in the current interview state"
            }
            Self::Config(_) => "Check your config.toml file and environment for errors",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable errors
            Self::EmptyPool { .. } | Self::NoKeyAvailable | Self::Config(_) => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }

    fn class(&self) -> ErrorClass {
        match self {
            Self::UnsupportedLanguage(_)
            | Self::InvalidExperienceLevel(_)
            | Self::InvalidRequest(_) => ErrorClass::Client,
            Self::SessionNotFound(_) | Self::LanguageNotFound(_) => ErrorClass::NotFound,
            Self::InvalidStateTransition { .. } => ErrorClass::Conflict,
            Self::NoKeyAvailable | Self::AllKeysExhausted { .. } => ErrorClass::Unavailable,
            Self::MalformedResponse(_) => ErrorClass::Upstream,
            Self::EmptyPool { .. } | Self::Config(_) | Self::Io(_) => ErrorClass::Internal,
        }
    }
}
