//! Structured turn extraction
//!
//! Models are asked for bare JSON but often wrap it in prose or code
//! fences. `ResponseParser::parse` runs an ordered list of extraction
//! strategies and keeps the first one whose candidate decodes into a
//! `ParsedTurn`. Nothing here checks whether the values make sense; the
//! conversation driver does that.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use sdk::errors::EngineError;
use tracing::debug;

/// Which strategy produced a parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// The whole text is JSON
    Direct,
    /// First block opened with ```` ```json ````
    JsonFence,
    /// First bare ```` ``` ```` block
    BareFence,
    /// From the first `{` to the last `}`
    BraceSpan,
}

impl ParseStrategy {
    pub const ORDER: [ParseStrategy; 4] = [
        ParseStrategy::Direct,
        ParseStrategy::JsonFence,
        ParseStrategy::BareFence,
        ParseStrategy::BraceSpan,
    ];

    fn candidate<'a>(&self, raw: &'a str) -> Option<&'a str> {
        match self {
            ParseStrategy::Direct => Some(raw.trim()),
            ParseStrategy::JsonFence => fenced_block(raw, "```json"),
            ParseStrategy::BareFence => fenced_block(raw, "```").map(skip_language_tag),
            ParseStrategy::BraceSpan => {
                let start = raw.find('{')?;
                let end = raw.rfind('}')?;
                (start < end).then(|| &raw[start..=end])
            }
        }
    }
}

/// One generated turn as the model described it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParsedTurn {
    #[serde(default, deserialize_with = "lenient_text")]
    pub question: String,

    #[serde(default)]
    pub evaluation: Option<ParsedEvaluation>,

    /// Raw tag, normally easy | medium | hard
    #[serde(default = "default_difficulty", deserialize_with = "lenient_text")]
    pub difficulty: String,

    /// Raw tag, normally IN_PROGRESS | COMPLETED
    #[serde(
        default = "default_status",
        alias = "interviewStatus",
        deserialize_with = "lenient_text"
    )]
    pub interview_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ParsedEvaluation {
    /// `None` when missing or not numeric
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub strengths: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub improvements: String,

    #[serde(default, alias = "correctedAnswer", deserialize_with = "lenient_text")]
    pub corrected_answer: String,
}

impl ParsedTurn {
    /// Whether the model declared the interview finished
    pub fn declares_completed(&self) -> bool {
        self.interview_status.trim().eq_ignore_ascii_case("COMPLETED")
    }
}

fn default_difficulty() -> String {
    "medium".to_string()
}

fn default_status() -> String {
    "IN_PROGRESS".to_string()
}

pub struct ResponseParser;

impl ResponseParser {
    /// Extract a `ParsedTurn` from raw model output.
    ///
    /// # Errors
    ///
    /// `MalformedResponse` when no strategy yields a decodable object.
    pub fn parse(raw: &str) -> Result<ParsedTurn, EngineError> {
        Self::parse_tagged(raw).map(|(turn, _)| turn)
    }

    /// Like `parse`, also reporting which strategy succeeded
    pub fn parse_tagged(raw: &str) -> Result<(ParsedTurn, ParseStrategy), EngineError> {
        for strategy in ParseStrategy::ORDER {
            let Some(candidate) = strategy.candidate(raw) else {
                continue;
            };
            match serde_json::from_str::<ParsedTurn>(candidate.trim()) {
                Ok(turn) => {
                    debug!("Parsed model output via {:?}", strategy);
                    return Ok((turn, strategy));
                }
                Err(e) => debug!("{:?} strategy failed: {}", strategy, e),
            }
        }

        Err(EngineError::MalformedResponse(format!(
            "no JSON object found in model output ({} chars)",
            raw.len()
        )))
    }
}

/// Body of the first block opened by `opener`, up to the next fence.
/// An unterminated block runs to the end of the text.
fn fenced_block<'a>(raw: &'a str, opener: &str) -> Option<&'a str> {
    let start = raw.find(opener)? + opener.len();
    let rest = &raw[start..];
    let end = rest.find("```").unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Drop a language tag such as `JSON` or `javascript` on the fence line
fn skip_language_tag(body: &str) -> &str {
    match body.find('\n') {
        Some(newline)
            if !body[..newline].trim().is_empty()
                && body[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            &body[newline + 1..]
        }
        _ => body,
    }
}

/// A string, a list of strings (joined by newlines), or null
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    })
}

/// A number or a numeric string
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_json() {
        let (turn, strategy) = ResponseParser::parse_tagged(r#"{"question":"q"}"#).unwrap();
        assert_eq!(turn.question, "q");
        assert_eq!(strategy, ParseStrategy::Direct);
    }

    #[test]
    fn test_json_fence() {
        let (turn, strategy) =
            ResponseParser::parse_tagged("```json\n{\"question\":\"q\"}\n```").unwrap();
        assert_eq!(turn.question, "q");
        assert_eq!(strategy, ParseStrategy::JsonFence);
    }

    #[test]
    fn test_bare_fence_with_tag() {
        let raw = "Here you go:\n```JSON\n{\"question\":\"q\"}\n```\nGood luck";
        let (turn, strategy) = ResponseParser::parse_tagged(raw).unwrap();
        assert_eq!(turn.question, "q");
        assert_eq!(strategy, ParseStrategy::BareFence);
    }

    #[test]
    fn test_surrounding_noise() {
        let (turn, strategy) =
            ResponseParser::parse_tagged(r#"noise {"question":"q"} trailing"#).unwrap();
        assert_eq!(turn.question, "q");
        assert_eq!(strategy, ParseStrategy::BraceSpan);
    }

    #[test]
    fn test_not_json_at_all() {
        let err = ResponseParser::parse("not json at all").unwrap_err();
        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }

    #[test]
    fn test_broken_fence_falls_through_to_braces() {
        let raw = "```json\n{broken\n```\nactually: {\"question\":\"q\"}";
        // The brace span covers the broken block too, so nothing decodes
        assert!(ResponseParser::parse(raw).is_err());

        let raw = "```json\nnot an object\n``` then {\"question\":\"q\"}";
        assert_eq!(ResponseParser::parse(raw).unwrap().question, "q");
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let turn = ResponseParser::parse(r#"{"question":"q"}"#).unwrap();
        assert_eq!(turn.difficulty, "medium");
        assert_eq!(turn.interview_status, "IN_PROGRESS");
        assert!(turn.evaluation.is_none());
        assert!(!turn.declares_completed());
    }

    #[test]
    fn test_full_turn_with_lenient_fields() {
        let raw = r#"{
            "question": "Explain ownership",
            "evaluation": {
                "score": "7.5",
                "strengths": ["clear", "concise"],
                "improvements": "more detail",
                "corrected_answer": "Ownership means..."
            },
            "difficulty": "hard",
            "interview_status": "COMPLETED"
        }"#;
        let turn = ResponseParser::parse(raw).unwrap();
        let evaluation = turn.evaluation.clone().unwrap();

        assert_eq!(evaluation.score, Some(7.5));
        assert_eq!(evaluation.strengths, "clear\nconcise");
        assert_eq!(evaluation.improvements, "more detail");
        assert_eq!(turn.difficulty, "hard");
        assert!(turn.declares_completed());
    }

    #[test]
    fn test_null_evaluation_and_bad_score() {
        let turn = ResponseParser::parse(r#"{"question":"q","evaluation":null}"#).unwrap();
        assert!(turn.evaluation.is_none());

        let turn =
            ResponseParser::parse(r#"{"question":"q","evaluation":{"score":"great"}}"#).unwrap();
        assert_eq!(turn.evaluation.unwrap().score, None);
    }

    #[test]
    fn test_non_ascii_question() {
        let raw = "```json\n{\"question\":\"स्वामित्व क्या है?\"}\n```";
        assert_eq!(ResponseParser::parse(raw).unwrap().question, "स्वामित्व क्या है?");
    }
}
