use super::openai::network_error;
use super::{http_client, LLMError, ProviderCall, TextGenerator};
use crate::keys::{ApiKey, Provider};
use async_trait::async_trait;
use serde_json::json;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages API
pub struct AnthropicGenerator {
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: http_client(),
        }
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn generate(&self, key: &ApiKey, call: &ProviderCall) -> super::Result<String> {
        let url = format!("{}/messages", self.base_url);

        let mut payload = json!({
            "model": call.model,
            "max_tokens": call.max_tokens,
            "temperature": call.temperature,
            "messages": [{ "role": "user", "content": call.prompt }],
        });
        if let Some(system) = &call.system_prompt {
            payload["system"] = json!(system);
        }

        let response = self
            .client
            .post(&url)
            .header("x-api-key", key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LLMError::from_status(Provider::Anthropic, status, text));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let content = data
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| LLMError::ParseError("No content array in response".to_string()))?;

        let full_content: String = content
            .iter()
            .filter_map(|item| item.get("text").and_then(|t| t.as_str()))
            .collect();

        if full_content.trim().is_empty() {
            return Err(LLMError::ParseError("Empty content".to_string()));
        }
        Ok(full_content)
    }
}
