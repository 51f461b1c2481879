//! Summary backend over a chat-completion model

use crate::{BackendError, RpcBackend};
use async_trait::async_trait;
use sdk::ProviderReply;
use serde_json::Value;
use std::sync::Arc;
use turnstile_engine::llm::{LLMProvider, Message};

pub struct LlmSummarizer {
    llm: Arc<dyn LLMProvider>,
}

impl LlmSummarizer {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    /// Summarize documents joined by newlines in one completion
    pub async fn summarize(&self, documents: &[String]) -> Result<ProviderReply, BackendError> {
        let docs = documents.join("\n");
        let messages = [
            Message::system("You are a helpful assistant that summarizes documents concisely."),
            Message::user(format!("Summarize:\n{}", docs)),
        ];

        tracing::info!(
            "Summarizing {} documents ({} chars) with {}",
            documents.len(),
            docs.chars().count(),
            self.llm.model()
        );

        let text = self
            .llm
            .generate(&messages, None)
            .await
            .map_err(|e| BackendError::Upstream(e.to_string()))?;

        Ok(ProviderReply::scored(text, self.llm.model()))
    }
}

fn documents_param(params: &Value) -> Result<Vec<String>, BackendError> {
    let items = params
        .get("documents")
        .and_then(Value::as_array)
        .ok_or_else(|| BackendError::InvalidParams("missing array param 'documents'".into()))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| BackendError::InvalidParams("documents must be strings".into()))
        })
        .collect()
}

#[async_trait]
impl RpcBackend for LlmSummarizer {
    fn tools(&self) -> Vec<String> {
        vec!["summarize".to_string()]
    }

    async fn call(&self, method: &str, params: &Value) -> Result<Value, BackendError> {
        match method {
            "summarize" => {
                let documents = documents_param(params)?;
                let reply = self.summarize(&documents).await?;
                serde_json::to_value(reply).map_err(|e| BackendError::Upstream(e.to_string()))
            }
            other => Err(BackendError::MethodNotFound(other.to_string())),
        }
    }
}
