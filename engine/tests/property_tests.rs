use proptest::prelude::*;
use std::collections::HashMap;

use viva_engine::keys::{ApiKey, KeyPool, Provider};
use viva_engine::llm::ResponseParser;

proptest! {
    // Any number of full cycles hands out every key equally often, in order
    #[test]
    fn test_rotation_is_fair(key_count in 1usize..8, cycles in 1usize..6) {
        let keys: Vec<ApiKey> = (0..key_count).map(|i| ApiKey::new(format!("key-{}", i))).collect();
        let pool = KeyPool::new(Provider::OpenAI, keys).unwrap();

        let mut counts: HashMap<String, usize> = HashMap::new();
        for call in 0..key_count * cycles {
            let key = pool.next();
            prop_assert_eq!(key.expose(), format!("key-{}", call % key_count));
            *counts.entry(key.expose().to_string()).or_insert(0) += 1;
        }

        prop_assert_eq!(counts.len(), key_count);
        prop_assert!(counts.values().all(|&n| n == cycles));
    }

    // Failures never change what rotation hands out, only what is available
    #[test]
    fn test_failures_only_shrink_available(
        key_count in 1usize..8,
        failed in proptest::collection::vec(any::<bool>(), 8),
    ) {
        let keys: Vec<ApiKey> = (0..key_count).map(|i| ApiKey::new(format!("key-{}", i))).collect();
        let pool = KeyPool::new(Provider::Gemini, keys.clone()).unwrap();

        for (key, fail) in keys.iter().zip(&failed) {
            if *fail {
                pool.mark_failed(key);
            }
        }

        let expected_failed = failed.iter().take(key_count).filter(|f| **f).count();
        prop_assert_eq!(pool.available().len(), key_count - expected_failed);
        for call in 0..key_count {
            let key = pool.next();
            prop_assert_eq!(key.expose(), format!("key-{}", call));
        }

        pool.reset_failed();
        prop_assert_eq!(pool.available().len(), key_count);
    }

    // A JSON object surrounded by prose, with or without a fence, is recovered
    #[test]
    fn test_parse_recovers_embedded_object(
        before in "[a-z ]{0,20}",
        after in "[a-z ]{0,20}",
        question in "[a-zA-Z0-9 ?.,:'\"-]{1,40}",
        fenced in any::<bool>(),
    ) {
        let object = serde_json::json!({
            "question": question,
            "difficulty": "hard",
            "interview_status": "IN_PROGRESS"
        })
        .to_string();
        let body = if fenced {
            format!("```json\n{}\n```", object)
        } else {
            object
        };
        let reply = format!("{}{}{}", before, body, after);

        let turn = ResponseParser::parse(&reply).unwrap();
        prop_assert_eq!(turn.question.as_str(), question.as_str());
        prop_assert_eq!(turn.difficulty.as_str(), "hard");
        prop_assert!(!turn.declares_completed());
    }

    // Text with no braces at all never parses
    #[test]
    fn test_brace_free_text_is_malformed(text in "[a-zA-Z0-9 .,!?\n]{0,80}") {
        prop_assert!(ResponseParser::parse(&text).is_err());
    }
}
