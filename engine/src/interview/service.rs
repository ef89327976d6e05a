//! Interview service
//!
//! The operations exposed over HTTP and the CLI. Validates input, owns the
//! session lifecycle around the driver, and answers catalog and health
//! queries.

use std::sync::Arc;

use sdk::errors::EngineError;
use sdk::types::{
    CompletionSummary, ExperienceLevel, ExperienceLevelInfo, GenerateTextRequest,
    GenerateTextResponse, HealthResponse, Language, LanguageInfo, Progress, PromptPreview, PromptPreviewRequest, StartInterviewRequest,
    StartInterviewResponse, SubmitAnswerRequest, TransitionResponse, TurnResponse,
};
use tracing::warn;
use uuid::Uuid;

use super::driver::ConversationDriver;
use super::prompts::{self, TurnContext};
use super::session::InterviewSession;
use super::store::SessionStore;
use crate::config::{Config, InterviewConfig};
use crate::keys::{Provider, ProviderRegistry};
use crate::llm::{GenerationGateway, GenerationRequest};

const ANONYMOUS_USER: &str = "anonymous";

pub struct InterviewService {
    store: Arc<SessionStore>,
    driver: ConversationDriver,
    config: InterviewConfig,
}

impl InterviewService {
    pub fn new(
        gateway: Arc<GenerationGateway>,
        store: Arc<SessionStore>,
        config: InterviewConfig,
    ) -> Self {
        Self {
            store,
            driver: ConversationDriver::new(gateway),
            config,
        }
    }

    /// Wire registry, gateway and an empty store from configuration
    pub fn from_config(config: &Config) -> Self {
        let registry = Arc::new(ProviderRegistry::from_config(&config.ai));
        let gateway = Arc::new(GenerationGateway::from_config(registry, &config.ai));
        Self::new(gateway, Arc::new(SessionStore::new()), config.interview.clone())
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        self.driver.gateway().registry()
    }

    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    /// Create a session and ask its first question.
    ///
    /// A session whose first question cannot be generated is discarded.
    pub async fn start(
        &self,
        request: StartInterviewRequest,
    ) -> Result<StartInterviewResponse, EngineError> {
        let role = validate_role(&request.role)?;
        let experience_level: ExperienceLevel = request.experience_level.parse()?;
        let language: Language = request.language.parse()?;
        let max_questions = self.max_questions(request.max_questions)?;

        let user_id = request
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(ANONYMOUS_USER);

        let session = InterviewSession::new(
            Uuid::new_v4().to_string(),
            user_id,
            role,
            experience_level,
            language,
            max_questions,
        );
        let session_id = session.id().to_string();
        let handle = self.store.create(session)?;

        let mut session = handle.lock().await;
        let (question, difficulty) = match self.driver.open(&mut session).await {
            Ok(first) => first,
            Err(e) => {
                warn!("Could not open session {}: {}", session_id, e);
                drop(session);
                self.store.remove(&session_id);
                return Err(e);
            }
        };

        Ok(StartInterviewResponse {
            session_id,
            question,
            difficulty,
            question_number: session.current_question_number(),
            total_questions: session.max_questions(),
            interview_status: session.status(),
            language,
        })
    }

    pub async fn submit_answer(
        &self,
        session_id: &str,
        request: SubmitAnswerRequest,
    ) -> Result<TurnResponse, EngineError> {
        if !request.duration.is_finite() || request.duration < 0.0 {
            return Err(EngineError::InvalidRequest(
                "duration must be a non-negative number of seconds".to_string(),
            ));
        }
        if !request.confidence.is_finite() {
            return Err(EngineError::InvalidRequest(
                "confidence must be a number".to_string(),
            ));
        }

        let handle = self.store.get(session_id)?;
        let mut session = handle.lock().await;
        self.driver.next_turn(&mut session, &request).await
    }

    pub async fn pause(&self, session_id: &str) -> Result<TransitionResponse, EngineError> {
        let handle = self.store.get(session_id)?;
        let mut session = handle.lock().await;
        session.pause()?;
        Ok(TransitionResponse {
            success: true,
            interview_status: session.status(),
        })
    }

    pub async fn resume(&self, session_id: &str) -> Result<TransitionResponse, EngineError> {
        let handle = self.store.get(session_id)?;
        let mut session = handle.lock().await;
        session.resume()?;
        Ok(TransitionResponse {
            success: true,
            interview_status: session.status(),
        })
    }

    pub async fn complete(&self, session_id: &str) -> Result<CompletionSummary, EngineError> {
        let handle = self.store.get(session_id)?;
        let mut session = handle.lock().await;
        Ok(session.complete())
    }

    pub async fn progress(&self, session_id: &str) -> Result<Progress, EngineError> {
        let handle = self.store.get(session_id)?;
        let session = handle.lock().await;
        Ok(session.progress())
    }

    pub fn languages(&self) -> Vec<LanguageInfo> {
        Language::ALL.iter().map(Language::info).collect()
    }

    /// Catalog entry for one language code; unknown codes are not found
    pub fn language(&self, code: &str) -> Result<LanguageInfo, EngineError> {
        code.parse::<Language>()
            .map(|language| language.info())
            .map_err(|_| EngineError::LanguageNotFound(code.trim().to_string()))
    }

    pub fn experience_levels(&self) -> Vec<ExperienceLevelInfo> {
        ExperienceLevel::ALL.iter().map(ExperienceLevel::info).collect()
    }

    /// Provider key counts, models and session count; never exposes keys
    pub fn health(&self) -> HealthResponse {
        let providers = self.driver.gateway().status();
        let status = if providers.iter().any(|p| p.available_keys > 0) {
            "healthy"
        } else {
            "degraded"
        };

        HealthResponse {
            status: status.to_string(),
            default_provider: self.driver.gateway().default_provider().to_string(),
            providers,
            supported_languages: Language::ALL.len(),
            active_sessions: self.store.len(),
        }
    }

    /// Free-form generation through the gateway, outside any session.
    ///
    /// An unknown provider name is a client error, not a configuration one.
    pub async fn generate_text(
        &self,
        request: GenerateTextRequest,
    ) -> Result<GenerateTextResponse, EngineError> {
        if request.prompt.trim().is_empty() {
            return Err(EngineError::InvalidRequest("prompt must not be empty".to_string()));
        }

        let mut generation = GenerationRequest::new(request.prompt);
        if let Some(name) = request.provider.as_deref().filter(|p| !p.trim().is_empty()) {
            let provider: Provider = name.parse().map_err(|_| {
                EngineError::InvalidRequest(format!("unknown provider '{}'", name.trim()))
            })?;
            generation = generation.with_provider(provider);
        }
        if let Some(model) = request.model.filter(|m| !m.trim().is_empty()) {
            generation = generation.with_model(model.trim());
        }
        if let Some(temperature) = request.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(EngineError::InvalidRequest(
                    "temperature must be between 0.0 and 2.0".to_string(),
                ));
            }
            generation = generation.with_temperature(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            if max_tokens == 0 {
                return Err(EngineError::InvalidRequest(
                    "maxTokens must be greater than 0".to_string(),
                ));
            }
            generation = generation.with_max_tokens(max_tokens);
        }

        let result = self.driver.gateway().generate(&generation).await?;
        Ok(GenerateTextResponse {
            text: result.text,
            provider: result.provider.to_string(),
            model: result.model,
        })
    }

    /// The prompts a turn with these inputs would send, without calling a
    /// provider
    pub fn prompt_preview(
        &self,
        request: &PromptPreviewRequest,
    ) -> Result<PromptPreview, EngineError> {
        let role = validate_role(&request.role)?;
        let experience_level: ExperienceLevel = request.experience_level.parse()?;
        let language: Language = request.language.parse()?;
        let max_questions = self.max_questions(request.max_questions)?;
        if request.question_number == 0 || request.question_number > max_questions {
            return Err(EngineError::InvalidRequest(format!(
                "questionNumber must be between 1 and {}",
                max_questions
            )));
        }

        let ctx = TurnContext {
            role,
            experience_level,
            language,
            max_questions,
            question_number: request.question_number,
            previous_question: &request.previous_question,
            candidate_answer: &request.candidate_answer,
        };

        Ok(PromptPreview {
            system_prompt: prompts::system_prompt().to_string(),
            user_prompt: prompts::user_prompt(&ctx),
        })
    }

    /// The requested question count, or the configured default when absent
    fn max_questions(&self, requested: Option<u32>) -> Result<u32, EngineError> {
        let max_questions = requested.unwrap_or(self.config.default_max_questions);
        let limit = self.config.max_questions_limit;
        if max_questions == 0 || max_questions > limit {
            return Err(EngineError::InvalidRequest(format!(
                "maxQuestions must be between 1 and {}",
                limit
            )));
        }
        Ok(max_questions)
    }
}

fn validate_role(role: &str) -> Result<&str, EngineError> {
    let role = role.trim();
    if role.is_empty() {
        return Err(EngineError::InvalidRequest("role must not be empty".to_string()));
    }
    Ok(role)
}
