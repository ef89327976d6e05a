//! Interview session and its state machine
//!
//! ```text
//! CREATED ──begin──▶ IN_PROGRESS ◀──resume── PAUSED
//!                        │  └──────pause──────▲
//!                        └─ last answer / declared done ─▶ COMPLETED
//! ```
//!
//! `complete` forces COMPLETED from any state. Every rejected operation
//! returns `InvalidStateTransition` and leaves the session untouched.
//! Every accepted operation refreshes `last_activity`, which the store uses
//! to expire abandoned sessions.

use chrono::{DateTime, Utc};
use sdk::errors::EngineError;
use sdk::types::{
    CompletionSummary, Difficulty, Evaluation, ExperienceLevel, InterviewStatus, Language, Progress,
};

/// One submitted answer; never modified after it is appended
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub question_number: u32,
    pub question: String,
    pub transcript: String,
    pub duration: f64,
    pub confidence: f64,
    pub evaluation: Option<Evaluation>,
    pub submitted_at: DateTime<Utc>,
}

/// Answer content supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnswer {
    pub transcript: String,
    pub duration: f64,
    pub confidence: f64,
    pub evaluation: Option<Evaluation>,
}

#[derive(Debug, Clone)]
pub struct InterviewSession {
    id: String,
    user_id: String,
    role: String,
    experience_level: ExperienceLevel,
    language: Language,
    max_questions: u32,
    status: InterviewStatus,
    current_question_number: u32,
    current_question: String,
    current_difficulty: Difficulty,
    answers: Vec<Answer>,
    total_duration: f64,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    last_activity: DateTime<Utc>,
}

impl InterviewSession {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        role: impl Into<String>,
        experience_level: ExperienceLevel,
        language: Language,
        max_questions: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            role: role.into(),
            experience_level,
            language,
            max_questions,
            status: InterviewStatus::Created,
            current_question_number: 1,
            current_question: String::new(),
            current_difficulty: Difficulty::default(),
            answers: Vec::new(),
            total_duration: 0.0,
            started_at: now,
            completed_at: None,
            last_activity: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn experience_level(&self) -> ExperienceLevel {
        self.experience_level
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn max_questions(&self) -> u32 {
        self.max_questions
    }

    pub fn status(&self) -> InterviewStatus {
        self.status
    }

    pub fn current_question_number(&self) -> u32 {
        self.current_question_number
    }

    /// Text of the question currently asked (empty before `begin`)
    pub fn current_question(&self) -> &str {
        &self.current_question
    }

    pub fn current_difficulty(&self) -> Difficulty {
        self.current_difficulty
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// When the last accepted operation happened
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Not completed, and untouched since `cutoff`
    pub fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.last_activity <= cutoff
    }

    /// Fail unless the session is in `expected`
    pub fn require(&self, action: &str, expected: InterviewStatus) -> Result<(), EngineError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(EngineError::transition(action, self.status))
        }
    }

    /// Whether the next answer fills the last slot
    pub fn next_answer_is_last(&self) -> bool {
        self.answers.len() as u32 + 1 >= self.max_questions
    }

    /// CREATED → IN_PROGRESS with the first question
    pub fn begin(&mut self, question: String, difficulty: Difficulty) -> Result<(), EngineError> {
        self.require("begin", InterviewStatus::Created)?;
        self.current_question = question;
        self.current_difficulty = difficulty;
        self.status = InterviewStatus::InProgress;
        self.touch();
        Ok(())
    }

    /// Replace the current question without consuming a slot
    pub fn replace_question(
        &mut self,
        question: String,
        difficulty: Difficulty,
    ) -> Result<(), EngineError> {
        self.require("ask a new question", InterviewStatus::InProgress)?;
        self.current_question = question;
        self.current_difficulty = difficulty;
        self.touch();
        Ok(())
    }

    /// Record an answer to the current question.
    ///
    /// The session completes when this was the last slot or the generator
    /// declared the interview done (`declared_complete`). Otherwise `next`
    /// becomes the current question. Returns the resulting status.
    pub fn submit_answer(
        &mut self,
        answer: NewAnswer,
        next: Option<(String, Difficulty)>,
        declared_complete: bool,
    ) -> Result<InterviewStatus, EngineError> {
        self.require("submit an answer", InterviewStatus::InProgress)?;

        self.answers.push(Answer {
            question_number: self.current_question_number,
            question: std::mem::take(&mut self.current_question),
            transcript: answer.transcript,
            duration: answer.duration,
            confidence: answer.confidence,
            evaluation: answer.evaluation,
            submitted_at: Utc::now(),
        });
        self.total_duration += answer.duration;
        self.current_question_number += 1;

        if declared_complete || self.answers.len() as u32 >= self.max_questions {
            self.finish();
        } else if let Some((question, difficulty)) = next {
            self.current_question = question;
            self.current_difficulty = difficulty;
        }
        self.touch();

        Ok(self.status)
    }

    /// IN_PROGRESS → PAUSED
    pub fn pause(&mut self) -> Result<(), EngineError> {
        self.require("pause", InterviewStatus::InProgress)?;
        self.status = InterviewStatus::Paused;
        self.touch();
        Ok(())
    }

    /// PAUSED → IN_PROGRESS
    pub fn resume(&mut self) -> Result<(), EngineError> {
        self.require("resume", InterviewStatus::Paused)?;
        self.status = InterviewStatus::InProgress;
        self.touch();
        Ok(())
    }

    /// Force COMPLETED and summarize. Completing twice returns the same
    /// summary without a second transition.
    pub fn complete(&mut self) -> CompletionSummary {
        if !self.status.is_terminal() {
            self.finish();
        }
        self.summary()
    }

    fn finish(&mut self) {
        let now = Utc::now();
        self.status = InterviewStatus::Completed;
        self.completed_at = Some(now);
        self.last_activity = now;
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn summary(&self) -> CompletionSummary {
        let total_answers = self.answers.len() as u32;
        let average_confidence = if self.answers.is_empty() {
            0.0
        } else {
            self.answers.iter().map(|a| a.confidence).sum::<f64>() / self.answers.len() as f64
        };

        CompletionSummary {
            session_id: self.id.clone(),
            user_id: self.user_id.clone(),
            started_at: self.started_at.to_rfc3339(),
            completed_at: self.completed_at.unwrap_or_else(Utc::now).to_rfc3339(),
            total_questions: self.max_questions,
            total_answers,
            total_duration: self.total_duration,
            average_confidence,
            status: self.status,
        }
    }

    pub fn progress(&self) -> Progress {
        let answered = self.answers.len() as u32;
        let progress_percentage = if self.max_questions > 0 {
            f64::from(answered) / f64::from(self.max_questions) * 100.0
        } else {
            0.0
        };

        Progress {
            session_id: self.id.clone(),
            status: self.status,
            total_questions: self.max_questions,
            answered,
            remaining: self.max_questions.saturating_sub(answered),
            progress_percentage,
            total_duration: self.total_duration,
            current_question_number: self.current_question_number,
        }
    }
}
