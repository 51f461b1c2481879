use proptest::prelude::*;
use sdk::errors::{EngineError, TurnstileErrorExt};
use sdk::types::confidence_from_text;

proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "\\PC*") {
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::History(error_str.clone()),
            EngineError::Provider(error_str.clone()),
            EngineError::Rpc(error_str.clone()),
            EngineError::LLMProvider(error_str.clone()),
            EngineError::Network(error_str.clone()),
            EngineError::InvalidQuery(error_str.clone()),
            EngineError::UnknownIntent(error_str.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            // Hints are static and never carry the raw message
            if error_str.len() > 40 {
                prop_assert!(!hint.contains(error_str.as_str()));
            }
        }
    }

    #[test]
    fn test_confidence_always_in_range(text in "\\PC*") {
        let c = confidence_from_text(&text);
        prop_assert!((0.4..=0.95).contains(&c));
    }
}
