//! Interviewer prompts
//!
//! The system prompt fixes the interviewer persona and the JSON-only reply
//! contract. The user prompt carries the turn: who is interviewed, which
//! question this is, and the answer to evaluate (if any).

use sdk::types::{ExperienceLevel, Language};

const SYSTEM_PROMPT: &str = "You are Viva, a professional multilingual technical interviewer.

Rules:
- Run a structured technical interview for the given role.
- Write ONLY in the selected interview language. English is allowed for technical terms.
- Stay professional, respectful and concise.
- Reply with a single valid JSON object and nothing else: no prose, no markdown.";

/// Inputs of one turn prompt
#[derive(Debug, Clone)]
pub struct TurnContext<'a> {
    pub role: &'a str,
    pub experience_level: ExperienceLevel,
    pub language: Language,
    pub max_questions: u32,
    pub question_number: u32,
    pub previous_question: &'a str,
    pub candidate_answer: &'a str,
}

impl TurnContext<'_> {
    fn evaluates(&self) -> bool {
        !self.candidate_answer.trim().is_empty()
    }
}

pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

pub fn user_prompt(ctx: &TurnContext<'_>) -> String {
    let language = format!("{} ({})", ctx.language.name(), ctx.language.native_name());
    let previous_question = non_empty_or_none(ctx.previous_question);
    let candidate_answer = non_empty_or_none(ctx.candidate_answer);

    let task = if ctx.evaluates() {
        format!(
            "The candidate answered question {number}.
1. Evaluate the answer in {language}: score it from 0 to 10, list strengths, list improvements and give a corrected model answer.
2. Then ask the next question, which must not repeat earlier ones.",
            number = ctx.question_number,
            language = language,
        )
    } else {
        format!(
            "No answer to evaluate yet. Ask interview question {number} in {language}, with difficulty suited to a {level} candidate. Omit the evaluation.",
            number = ctx.question_number,
            language = language,
            level = ctx.experience_level.code(),
        )
    };

    let completion = if ctx.evaluates() && ctx.question_number >= ctx.max_questions {
        "This was the final question: set interview_status to \"COMPLETED\"."
    } else {
        "Set interview_status to \"IN_PROGRESS\"."
    };

    format!(
        r#"Interview details:
- Role: {role}
- Experience level: {level}
- Interview language: {language}
- Total questions: {total}
- Current question number: {number}

Previous question: {previous_question}

Candidate answer: {candidate_answer}

Task:
{task}

Everything must be written in {language}. Do not switch languages.

Reply strictly in this JSON format:
{{
  "question": "string",
  "evaluation": {{
    "score": number,
    "strengths": "string",
    "improvements": "string",
    "corrected_answer": "string"
  }},
  "difficulty": "easy | medium | hard",
  "interview_status": "IN_PROGRESS | COMPLETED"
}}

{completion}"#,
        role = ctx.role,
        level = ctx.experience_level.code(),
        language = language,
        total = ctx.max_questions,
        number = ctx.question_number,
        previous_question = previous_question,
        candidate_answer = candidate_answer,
        task = task,
        completion = completion,
    )
}

fn non_empty_or_none(text: &str) -> &str {
    if text.trim().is_empty() {
        "None"
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(question_number: u32, previous: &'a str, answer: &'a str) -> TurnContext<'a> {
        TurnContext {
            role: "Backend Engineer",
            experience_level: ExperienceLevel::Senior,
            language: Language::Hindi,
            max_questions: 3,
            question_number,
            previous_question: previous,
            candidate_answer: answer,
        }
    }

    #[test]
    fn test_first_question_prompt() {
        let prompt = user_prompt(&ctx(1, "", ""));
        assert!(prompt.contains("Role: Backend Engineer"));
        assert!(prompt.contains("Experience level: senior"));
        assert!(prompt.contains("Hindi (हिंदी)"));
        assert!(prompt.contains("Previous question: None"));
        assert!(prompt.contains("Candidate answer: None"));
        assert!(prompt.contains("Omit the evaluation"));
        assert!(prompt.contains("\"IN_PROGRESS\""));
    }

    #[test]
    fn test_evaluation_prompt() {
        let prompt = user_prompt(&ctx(2, "What is a mutex?", "A lock"));
        assert!(prompt.contains("Previous question: What is a mutex?"));
        assert!(prompt.contains("Candidate answer: A lock"));
        assert!(prompt.contains("score it from 0 to 10"));
        assert!(!prompt.contains("final question"));
    }

    #[test]
    fn test_last_question_asks_for_completion() {
        let prompt = user_prompt(&ctx(3, "Q3", "answer"));
        assert!(prompt.contains("This was the final question"));
    }

    #[test]
    fn test_system_prompt_demands_json() {
        assert!(system_prompt().contains("valid JSON"));
    }
}
