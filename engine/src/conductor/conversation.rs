//! Answers questions about earlier turns

use crate::history::TurnRecord;
use crate::llm::{self, preview, LLMProvider, Message};
use async_trait::async_trait;
use sdk::confidence_from_text;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Reply used when there is no history to talk about
pub const NO_HISTORY_REPLY: &str =
    "I don't have any previous conversation history to reference. Please start a new search or query.";

const SEARCH_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationReply {
    pub text: String,
    pub confidence: f64,
}

/// Produces an answer from a non-empty window of recent turns (most recent first)
#[async_trait]
pub trait ConversationResponder: Send + Sync {
    async fn respond(&self, query: &str, history: &[&TurnRecord]) -> llm::Result<ConversationReply>;
}

/// Answer `query` from `history`, skipping the responder when there is none
pub async fn answer_from_history(
    responder: &dyn ConversationResponder,
    query: &str,
    history: &[&TurnRecord],
) -> llm::Result<ConversationReply> {
    if history.is_empty() {
        debug!("No history to answer from");
        return Ok(ConversationReply {
            text: NO_HISTORY_REPLY.to_string(),
            confidence: 1.0,
        });
    }
    responder.respond(query, history).await
}

pub struct LlmConversationResponder {
    llm: Arc<dyn LLMProvider>,
}

impl LlmConversationResponder {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }
}

/// Render turns as numbered `Conversation {i}` blocks
pub fn history_context(history: &[&TurnRecord]) -> String {
    let mut context = String::from("Previous conversation history:\n\n");
    for (i, record) in history.iter().enumerate() {
        context.push_str(&format!("Conversation {}:\n", i + 1));
        context.push_str(&format!("  Query: {}\n", record.query));
        if record.has_search() {
            context.push_str(&format!(
                "  Search Results: {}\n",
                preview(&record.search_result, SEARCH_PREVIEW_CHARS)
            ));
        }
        if record.has_summary() {
            context.push_str(&format!("  Summary: {}\n", record.summary));
        }
        if !record.conversation_response.trim().is_empty() {
            context.push_str(&format!("  Answer: {}\n", record.conversation_response));
        }
        context.push('\n');
    }
    context
}

#[async_trait]
impl ConversationResponder for LlmConversationResponder {
    async fn respond(&self, query: &str, history: &[&TurnRecord]) -> llm::Result<ConversationReply> {
        let prompt = format!(
            "Based on the conversation history below, answer the user's question about previous conversations.\n\n\
             {}\n\
             User's question: \"{}\"\n\n\
             Provide a helpful and concise answer based on the conversation history. \
             If the question cannot be answered from the history, politely say so.\n",
            history_context(history),
            query
        );
        let messages = [
            Message::system(
                "You are a helpful assistant that answers questions about previous conversations. \
                 Use the conversation history to provide accurate and helpful responses.",
            ),
            Message::user(prompt),
        ];

        info!(
            "Answering conversation query over {} turns with {}",
            history.len(),
            self.llm.model()
        );
        let text = self.llm.generate(&messages, Some(0.3)).await?;
        Ok(ConversationReply {
            confidence: confidence_from_text(&text),
            text,
        })
    }
}
