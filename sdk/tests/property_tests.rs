use proptest::prelude::*;
use sdk::errors::{EngineError, ErrorClass, VivaErrorExt};
use sdk::types::{Difficulty, Language};

proptest! {
    // Hints are fixed text: whatever the error carries never leaks into them
    #[test]
    fn test_error_hints_never_echo_payload(payload in "[a-zA-Z0-9_-]{12,40}") {
        let errs = vec![
            EngineError::Config(payload.clone()),
            EngineError::MalformedResponse(payload.clone()),
            EngineError::UnsupportedLanguage(payload.clone()),
            EngineError::InvalidExperienceLevel(payload.clone()),
            EngineError::InvalidRequest(payload.clone()),
            EngineError::SessionNotFound(payload.clone()),
            EngineError::LanguageNotFound(payload.clone()),
            EngineError::AllKeysExhausted { provider: payload.clone(), attempts: 2 },
            EngineError::transition(&payload, "PAUSED"),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            prop_assert!(!hint.contains(&payload));
            prop_assert!(!err.code().is_empty());
            prop_assert!(err.code().chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_language_parse_ignores_case_and_padding(
        index in 0usize..11,
        upper in proptest::collection::vec(any::<bool>(), 16),
        pad in " {0,3}",
    ) {
        let language = Language::ALL[index];
        let mixed: String = language
            .code()
            .chars()
            .zip(upper.iter().cycle())
            .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c })
            .collect();

        let parsed = format!("{}{}{}", pad, mixed, pad).parse::<Language>();
        prop_assert_eq!(parsed.ok(), Some(language));
    }

    #[test]
    fn test_unknown_languages_are_client_errors(name in "[a-z]{3,12}") {
        prop_assume!(Language::ALL.iter().all(|l| l.code() != name));
        let err = name.parse::<Language>().unwrap_err();
        prop_assert_eq!(err.class(), ErrorClass::Client);
        prop_assert_eq!(err.code(), "UNSUPPORTED_LANGUAGE");
    }

    #[test]
    fn test_unknown_difficulty_tags_fall_back_to_medium(tag in "[a-z|]{0,12}") {
        prop_assume!(tag != "easy" && tag != "hard");
        prop_assert_eq!(Difficulty::from_tag(&tag), Difficulty::Medium);
    }
}
