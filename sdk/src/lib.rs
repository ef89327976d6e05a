//! Viva SDK
//!
//! Shared library providing the error taxonomy and the interview wire types.
//! This crate is used by the engine and by anything that talks to it.

/// Error types and handling
pub mod errors;

/// Interview vocabulary and request/response types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, ErrorClass, VivaErrorExt};
pub use types::{
    CompletionSummary, Difficulty, Evaluation, ExperienceLevel, InterviewStatus, Language,
    Progress, StartInterviewRequest, StartInterviewResponse, SubmitAnswerRequest, TurnResponse,
};
