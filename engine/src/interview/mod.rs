//! Interview orchestration
//!
//! - `session`: one interview and its state machine
//! - `store`: the in-memory registry of sessions
//! - `prompts`: system and per-turn prompts
//! - `driver`: runs a turn against the generation gateway
//! - `service`: the exposed operations

pub mod driver;
pub mod prompts;
pub mod service;
pub mod session;
pub mod store;

pub use driver::ConversationDriver;
pub use service::InterviewService;
pub use session::{Answer, InterviewSession, NewAnswer};
pub use store::{SessionHandle, SessionStore};
