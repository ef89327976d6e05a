//! Interview vocabulary and request/response shapes
//!
//! These types cross the service boundary (HTTP JSON, CLI output) and are
//! shared by the engine and any client.

use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interview language
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Hindi,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Marathi,
    Gujarati,
    Bengali,
    Punjabi,
    Urdu,
}

impl Language {
    /// Every supported language, in catalog order
    pub const ALL: [Language; 11] = [
        Language::English,
        Language::Hindi,
        Language::Tamil,
        Language::Telugu,
        Language::Kannada,
        Language::Malayalam,
        Language::Marathi,
        Language::Gujarati,
        Language::Bengali,
        Language::Punjabi,
        Language::Urdu,
    ];

    /// Lowercase language code used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Hindi => "hindi",
            Language::Tamil => "tamil",
            Language::Telugu => "telugu",
            Language::Kannada => "kannada",
            Language::Malayalam => "malayalam",
            Language::Marathi => "marathi",
            Language::Gujarati => "gujarati",
            Language::Bengali => "bengali",
            Language::Punjabi => "punjabi",
            Language::Urdu => "urdu",
        }
    }

    /// English name of the language
    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Kannada => "Kannada",
            Language::Malayalam => "Malayalam",
            Language::Marathi => "Marathi",
            Language::Gujarati => "Gujarati",
            Language::Bengali => "Bengali",
            Language::Punjabi => "Punjabi",
            Language::Urdu => "Urdu",
        }
    }

    /// Name of the language written in its own script
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "हिंदी",
            Language::Tamil => "தமிழ்",
            Language::Telugu => "తెలుగు",
            Language::Kannada => "ಕನ್ನಡ",
            Language::Malayalam => "മലയാളം",
            Language::Marathi => "मराठी",
            Language::Gujarati => "ગુજરાતી",
            Language::Bengali => "বাংলা",
            Language::Punjabi => "ਪੰਜਾਬੀ",
            Language::Urdu => "اردو",
        }
    }

    pub fn info(&self) -> LanguageInfo {
        LanguageInfo {
            code: self.code().to_string(),
            name: self.name().to_string(),
            native_name: self.native_name().to_string(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = EngineError;

    /// Case-insensitive lookup by code
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.code() == wanted)
            .ok_or_else(|| EngineError::UnsupportedLanguage(s.to_string()))
    }
}

/// Candidate seniority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    Mid,
    Senior,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 3] = [
        ExperienceLevel::Junior,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
        }
    }

    pub fn info(&self) -> ExperienceLevelInfo {
        let (name, description) = match self {
            ExperienceLevel::Junior => (
                "Junior (0-2 years)",
                "Entry-level positions, basic technical questions",
            ),
            ExperienceLevel::Mid => (
                "Mid-Level (2-5 years)",
                "Intermediate positions, moderate complexity questions",
            ),
            ExperienceLevel::Senior => (
                "Senior (5+ years)",
                "Senior positions, advanced technical and architectural questions",
            ),
        };
        ExperienceLevelInfo {
            code: self.code().to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for ExperienceLevel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "junior" => Ok(ExperienceLevel::Junior),
            "mid" => Ok(ExperienceLevel::Mid),
            "senior" => Ok(ExperienceLevel::Senior),
            _ => Err(EngineError::InvalidExperienceLevel(s.to_string())),
        }
    }
}

/// Difficulty tag attached to a generated question
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Lenient mapping from a model-produced tag; anything unknown is `Medium`
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// Lifecycle state of an interview session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewStatus {
    Created,
    InProgress,
    Paused,
    Completed,
}

impl InterviewStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InterviewStatus::Completed)
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterviewStatus::Created => write!(f, "CREATED"),
            InterviewStatus::InProgress => write!(f, "IN_PROGRESS"),
            InterviewStatus::Paused => write!(f, "PAUSED"),
            InterviewStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// Evaluation of one candidate answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// Score in the range 0-10
    pub score: f64,
    pub strengths: String,
    pub improvements: String,
    pub corrected_answer: String,
}

/// Body of `start`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewRequest {
    pub role: String,
    pub experience_level: String,
    pub language: String,
    /// Falls back to the server's configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_questions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Result of `start`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewResponse {
    pub session_id: String,
    pub question: String,
    pub difficulty: Difficulty,
    pub question_number: u32,
    pub total_questions: u32,
    pub interview_status: InterviewStatus,
    pub language: Language,
}

/// Body of `submitAnswer`
///
/// An empty `candidate_answer` asks for a fresh question without evaluating
/// anything. `question_number`, when present, must match the question the
/// session is currently on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_question: Option<String>,
    #[serde(default)]
    pub candidate_answer: String,
    /// Seconds spent answering
    #[serde(default)]
    pub duration: f64,
    /// Transcription confidence (0.0-1.0)
    #[serde(default)]
    pub confidence: f64,
}

/// Result of `submitAnswer`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    /// Number of the question the candidate should answer next
    pub question_number: u32,
    pub total_questions: u32,
    pub interview_status: InterviewStatus,
}

/// Result of `pause` / `resume`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub success: bool,
    pub interview_status: InterviewStatus,
}

/// Result of `complete`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub session_id: String,
    pub user_id: String,
    /// RFC 3339 timestamp
    pub started_at: String,
    /// RFC 3339 timestamp
    pub completed_at: String,
    pub total_questions: u32,
    pub total_answers: u32,
    /// Seconds
    pub total_duration: f64,
    pub average_confidence: f64,
    pub status: InterviewStatus,
}

/// Result of `progress`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub session_id: String,
    pub status: InterviewStatus,
    pub total_questions: u32,
    pub answered: u32,
    pub remaining: u32,
    pub progress_percentage: f64,
    pub total_duration: f64,
    pub current_question_number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
    pub native_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceLevelInfo {
    pub code: String,
    pub name: String,
    pub description: String,
}

/// Body of `promptPreview`: the turn inputs without any session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPreviewRequest {
    pub role: String,
    pub experience_level: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_questions: Option<u32>,
    #[serde(default = "default_question_number")]
    pub question_number: u32,
    #[serde(default)]
    pub previous_question: String,
    #[serde(default)]
    pub candidate_answer: String,
}

fn default_question_number() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPreview {
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Key counts and configured model for one provider; never the keys
/// themselves
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealth {
    pub provider: String,
    pub keys: usize,
    pub available_keys: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Body of `generateText`: a free-form prompt with optional overrides.
/// Unset fields use the configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTextRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Generated text and the provider and model that produced it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTextResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub default_provider: String,
    pub providers: Vec<ProviderHealth>,
    pub supported_languages: usize,
    pub active_sessions: usize,
}
