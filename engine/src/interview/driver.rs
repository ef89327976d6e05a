//! Conversation driver
//!
//! Runs one turn: prompt, generate, parse, apply to the session. The caller
//! holds the session's mutex for the whole call. Anything that fails before
//! the final state machine call (generation, parsing, a missing question)
//! leaves the session exactly as it was.

use std::sync::Arc;

use sdk::errors::EngineError;
use sdk::types::{Difficulty, Evaluation, InterviewStatus, SubmitAnswerRequest, TurnResponse};
use tracing::{debug, info};

use super::prompts::{self, TurnContext};
use super::session::{InterviewSession, NewAnswer};
use crate::llm::parser::{ParsedEvaluation, ParsedTurn};
use crate::llm::{GenerationGateway, GenerationRequest, ResponseParser};

pub struct ConversationDriver {
    gateway: Arc<GenerationGateway>,
}

impl ConversationDriver {
    pub fn new(gateway: Arc<GenerationGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<GenerationGateway> {
        &self.gateway
    }

    /// Generate the first question and move the session to IN_PROGRESS
    pub async fn open(
        &self,
        session: &mut InterviewSession,
    ) -> Result<(String, Difficulty), EngineError> {
        session.require("begin", InterviewStatus::Created)?;

        let turn = self.generate(session, "", "").await?;
        let question = require_question(&turn)?;
        let difficulty = Difficulty::from_tag(&turn.difficulty);

        session.begin(question.clone(), difficulty)?;
        info!(
            "Session {} started ({} question(s), {})",
            session.id(),
            session.max_questions(),
            session.language()
        );
        Ok((question, difficulty))
    }

    /// Run one turn.
    ///
    /// An empty answer asks for a fresh current question and leaves the
    /// pointer alone. Otherwise the answer is evaluated and recorded; the
    /// session completes when the slots run out or the model says so.
    pub async fn next_turn(
        &self,
        session: &mut InterviewSession,
        request: &SubmitAnswerRequest,
    ) -> Result<TurnResponse, EngineError> {
        let action = if request.candidate_answer.trim().is_empty() {
            "ask a new question"
        } else {
            "submit an answer"
        };
        session.require(action, InterviewStatus::InProgress)?;

        if let Some(number) = request.question_number {
            if number != session.current_question_number() {
                return Err(EngineError::InvalidStateTransition {
                    action: format!("answer question {}", number),
                    state: format!("on question {}", session.current_question_number()),
                });
            }
        }

        let previous_question = match request.previous_question.as_deref() {
            Some(text) if session.current_question().is_empty() => text.to_string(),
            _ => session.current_question().to_string(),
        };
        let answer = request.candidate_answer.trim();

        let turn = self.generate(session, &previous_question, answer).await?;
        let difficulty = Difficulty::from_tag(&turn.difficulty);

        if answer.is_empty() {
            let question = require_question(&turn)?;
            session.replace_question(question.clone(), difficulty)?;
            return Ok(TurnResponse {
                evaluation: None,
                next_question: Some(question),
                difficulty: Some(difficulty),
                question_number: session.current_question_number(),
                total_questions: session.max_questions(),
                interview_status: session.status(),
            });
        }

        let declared_complete = turn.declares_completed();
        let completes = declared_complete || session.next_answer_is_last();
        let next = if completes {
            None
        } else {
            Some((require_question(&turn)?, difficulty))
        };
        let evaluation = turn.evaluation.as_ref().map(normalize_evaluation);

        let status = session.submit_answer(
            NewAnswer {
                transcript: answer.to_string(),
                duration: request.duration.max(0.0),
                confidence: request.confidence.clamp(0.0, 1.0),
                evaluation: evaluation.clone(),
            },
            next.clone(),
            declared_complete,
        )?;

        if status == InterviewStatus::Completed {
            info!(
                "Session {} completed after {} answer(s)",
                session.id(),
                session.answers().len()
            );
        }

        Ok(TurnResponse {
            evaluation,
            next_question: next.as_ref().map(|(q, _)| q.clone()),
            difficulty: next.map(|(_, d)| d),
            question_number: session.current_question_number(),
            total_questions: session.max_questions(),
            interview_status: status,
        })
    }

    async fn generate(
        &self,
        session: &InterviewSession,
        previous_question: &str,
        candidate_answer: &str,
    ) -> Result<ParsedTurn, EngineError> {
        let ctx = TurnContext {
            role: session.role(),
            experience_level: session.experience_level(),
            language: session.language(),
            max_questions: session.max_questions(),
            question_number: session.current_question_number(),
            previous_question,
            candidate_answer,
        };
        let request = GenerationRequest::new(prompts::user_prompt(&ctx))
            .with_system_prompt(prompts::system_prompt());

        let result = self.gateway.generate(&request).await?;
        debug!(
            "Session {} turn {} generated by {} ({})",
            session.id(),
            ctx.question_number,
            result.provider,
            result.model
        );
        ResponseParser::parse(&result.text)
    }
}

fn require_question(turn: &ParsedTurn) -> Result<String, EngineError> {
    let question = turn.question.trim();
    if question.is_empty() {
        return Err(EngineError::MalformedResponse(
            "model reply has no question".to_string(),
        ));
    }
    Ok(question.to_string())
}

fn normalize_evaluation(raw: &ParsedEvaluation) -> Evaluation {
    Evaluation {
        score: raw
            .score
            .filter(|s| s.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 10.0),
        strengths: raw.strengths.trim().to_string(),
        improvements: raw.improvements.trim().to_string(),
        corrected_answer: raw.corrected_answer.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_clamped() {
        let raw = |score| ParsedEvaluation {
            score,
            ..Default::default()
        };
        assert_eq!(normalize_evaluation(&raw(Some(14.0))).score, 10.0);
        assert_eq!(normalize_evaluation(&raw(Some(-2.0))).score, 0.0);
        assert_eq!(normalize_evaluation(&raw(Some(6.5))).score, 6.5);
        assert_eq!(normalize_evaluation(&raw(None)).score, 0.0);
        assert_eq!(normalize_evaluation(&raw(Some(f64::NAN))).score, 0.0);
    }

    #[test]
    fn test_blank_question_is_malformed() {
        let turn = ParsedTurn {
            question: "   ".to_string(),
            evaluation: None,
            difficulty: "easy".to_string(),
            interview_status: "IN_PROGRESS".to_string(),
        };
        assert!(matches!(
            require_question(&turn),
            Err(EngineError::MalformedResponse(_))
        ));
    }
}
