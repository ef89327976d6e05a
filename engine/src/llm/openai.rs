use super::{http_client, LLMError, ProviderCall, TextGenerator};
use crate::keys::{ApiKey, Provider};
use async_trait::async_trait;
use serde_json::json;

/// OpenAI chat completions
pub struct OpenAIGenerator {
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: http_client(),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAIGenerator {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn generate(&self, key: &ApiKey, call: &ProviderCall) -> super::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::new();
        if let Some(system) = &call.system_prompt {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": call.prompt }));

        let payload = json!({
            "model": call.model,
            "messages": messages,
            "temperature": call.temperature,
            "max_tokens": call.max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(key.expose())
            .json(&payload)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LLMError::from_status(Provider::OpenAI, status, text));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let message = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|choice| choice.get("message"))
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        match message.get("content").and_then(|c| c.as_str()) {
            Some(content) if !content.trim().is_empty() => Ok(content.to_string()),
            _ => Err(LLMError::ParseError("Empty content".to_string())),
        }
    }
}

pub(crate) fn network_error(e: reqwest::Error) -> LLMError {
    if e.is_timeout() {
        LLMError::Timeout
    } else {
        LLMError::NetworkError(e.to_string())
    }
}
