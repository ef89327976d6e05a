//! Viva Engine Library
//!
//! Core of the Viva interview engine: API key rotation and provider
//! fallback, text generation, and interview session orchestration. Used by
//! the `viva` binary and by the integration tests.

/// Configuration management module
pub mod config;

/// API keys, key pools and the provider registry
pub mod keys;

/// Text generation: provider adapters, gateway and response parsing
pub mod llm;

/// Interview sessions, turns and the service facade
pub mod interview;

/// HTTP API
pub mod api;

/// Periodic key reset and session purge
pub mod maintenance;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
