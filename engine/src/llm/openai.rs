use super::{LLMError, LLMProvider, Message};
use crate::config::OpenAIConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// OpenAI-compatible `/chat/completions` client
pub struct OpenAIProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Build from config, reading the key from the configured env var
    pub fn from_config(config: &OpenAIConfig, timeout: Duration) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(
                "{} is not set; OpenAI requests will fail authentication",
                config.api_key_env
            );
        }
        Self::new(&config.base_url, &config.model, api_key, timeout)
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn check_health(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, messages: &[Message], temperature: Option<f32>) -> super::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LLMError::AuthenticationFailed("API key not configured".to_string()))?;

        let url = format!("{}/chat/completions", self.base_url);

        let api_messages: Vec<_> = messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.to_string(),
                    "content": msg.content
                })
            })
            .collect();

        let mut payload = json!({
            "model": self.model,
            "messages": api_messages,
        });
        if let Some(t) = temperature {
            payload["temperature"] = json!(t);
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(LLMError::AuthenticationFailed(text));
            } else if status.as_u16() == 429 {
                return Err(LLMError::RateLimitExceeded);
            } else if status.is_server_error() {
                return Err(LLMError::ProviderUnavailable(format!("{}: {}", status, text)));
            } else {
                return Err(LLMError::InvalidRequest(text));
            }
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        let message = choice
            .get("message")
            .ok_or_else(|| LLMError::ParseError("No message in choice".to_string()))?;

        match message.get("content").and_then(|c| c.as_str()) {
            Some(content) if !content.trim().is_empty() => Ok(content.trim().to_string()),
            _ => Err(LLMError::ParseError("Empty content".to_string())),
        }
    }
}
