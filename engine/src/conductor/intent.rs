//! Intent classification
//!
//! Decides whether a query wants a search, a summary, or an answer about
//! earlier turns. Classification never fails outward: any provider error or
//! unrecognised reply falls back to `search`.

use crate::conductor::types::Intent;
use crate::history::TurnRecord;
use crate::llm::{preview, LLMProvider, Message};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

const SUMMARY_PREVIEW_CHARS: usize = 100;

/// Picks an intent for a query given recent turns (oldest first)
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, query: &str, history: &[&TurnRecord]) -> Intent;
}

/// Classifier backed by a chat-completion model
pub struct LlmIntentClassifier {
    llm: Arc<dyn LLMProvider>,
}

impl LlmIntentClassifier {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    fn build_prompt(query: &str, history: &[&TurnRecord]) -> String {
        let mut context = String::new();
        if !history.is_empty() {
            context.push_str("\n\nRecent conversation history:\n");
            for (i, record) in history.iter().enumerate() {
                context.push_str(&format!("{}. Query: {}\n", i + 1, record.query));
                if record.has_summary() {
                    context.push_str(&format!(
                        "   Summary: {}\n",
                        preview(&record.summary, SUMMARY_PREVIEW_CHARS)
                    ));
                }
            }
        }

        format!(
            "Analyze the following user query and determine their intent.{context}\n\n\
             User Query: \"{query}\"\n\n\
             The user wants to:\n\
             - \"search\" - if they're asking a NEW question or want to search for NEW information\n\
             - \"summarize\" - if they want a summary or brief of search results\n\
             - \"conversation_query\" - if they're asking ABOUT previous conversations \
             (e.g., \"what did we discuss?\", \"what was the last thing we talked about?\", \
             \"remind me what we searched for\")\n\n\
             Respond with ONLY one word: search, summarize, or conversation_query\n"
        )
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, query: &str, history: &[&TurnRecord]) -> Intent {
        let messages = [
            Message::system(
                "You are a helpful assistant that analyzes user queries to determine intent. \
                 Always respond with exactly one word: search, summarize, or conversation_query.",
            ),
            Message::user(Self::build_prompt(query, history)),
        ];

        match self.llm.generate(&messages, Some(0.3)).await {
            Ok(reply) => match parse_intent_label(&reply) {
                Some(intent) => {
                    debug!("Classified intent as {}", intent);
                    intent
                }
                None => {
                    warn!(
                        "Unrecognised intent reply '{}', defaulting to search",
                        preview(&reply, 50)
                    );
                    Intent::Search
                }
            },
            Err(e) => {
                warn!("Intent classification failed, defaulting to search: {}", e);
                Intent::Search
            }
        }
    }
}

/// First intent label found in a free-text model reply
pub fn parse_intent_label(text: &str) -> Option<Intent> {
    let text = text.trim().to_lowercase();
    Intent::ALL
        .into_iter()
        .find(|intent| text.contains(intent.as_str()))
}

/// Always returns the same intent; used when no model is configured
pub struct FixedIntentClassifier(pub Intent);

#[async_trait]
impl IntentClassifier for FixedIntentClassifier {
    async fn classify(&self, _query: &str, _history: &[&TurnRecord]) -> Intent {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMError, Result as LlmResult};
    use std::sync::Mutex;

    struct ScriptedLlm {
        reply: LlmResult<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(LLMError::Timeout),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedLlm {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, messages: &[Message], _t: Option<f32>) -> LlmResult<String> {
            self.prompts
                .lock()
                .unwrap()
                .push(messages.last().unwrap().content.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(LLMError::Timeout),
            }
        }
    }

    #[test]
    fn test_parse_intent_label() {
        assert_eq!(parse_intent_label("Search"), Some(Intent::Search));
        assert_eq!(parse_intent_label(" summarize.\n"), Some(Intent::Summarize));
        assert_eq!(
            parse_intent_label("conversation_query"),
            Some(Intent::ConversationQuery)
        );
        assert_eq!(parse_intent_label("no idea"), None);
    }

    #[tokio::test]
    async fn test_llm_reply_is_used() {
        let classifier = LlmIntentClassifier::new(Arc::new(ScriptedLlm::replying("summarize")));
        assert_eq!(classifier.classify("brief me", &[]).await, Intent::Summarize);
    }

    #[tokio::test]
    async fn test_failure_defaults_to_search() {
        let classifier = LlmIntentClassifier::new(Arc::new(ScriptedLlm::failing()));
        assert_eq!(classifier.classify("anything", &[]).await, Intent::Search);

        let classifier = LlmIntentClassifier::new(Arc::new(ScriptedLlm::replying("maybe?")));
        assert_eq!(classifier.classify("anything", &[]).await, Intent::Search);
    }

    #[tokio::test]
    async fn test_prompt_carries_history() {
        let llm = Arc::new(ScriptedLlm::replying("search"));
        let classifier = LlmIntentClassifier::new(llm.clone());

        let mut earlier = TurnRecord::new(1, "What is Rust?");
        earlier.summary = "x".repeat(150);
        classifier.classify("and Go?", &[&earlier]).await;

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("1. Query: What is Rust?"));
        assert!(prompts[0].contains(&format!("   Summary: {}...", "x".repeat(100))));
        assert!(prompts[0].contains("User Query: \"and Go?\""));
    }
}
