use super::openai::network_error;
use super::{http_client, LLMError, ProviderCall, TextGenerator};
use crate::keys::{ApiKey, Provider};
use async_trait::async_trait;
use serde_json::json;

/// Google Gemini `generateContent`
///
/// The key travels in the `x-goog-api-key` header rather than the query
/// string, so request URLs that end up in error messages stay clean.
pub struct GeminiGenerator {
    base_url: String,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: http_client(),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(&self, key: &ApiKey, call: &ProviderCall) -> super::Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, call.model);

        let mut payload = serde_json::Map::new();
        payload.insert(
            "contents".to_string(),
            json!([{ "role": "user", "parts": [{ "text": call.prompt }] }]),
        );
        payload.insert(
            "generationConfig".to_string(),
            json!({
                "temperature": call.temperature,
                "maxOutputTokens": call.max_tokens,
            }),
        );
        if let Some(system) = &call.system_prompt {
            payload.insert(
                "systemInstruction".to_string(),
                json!({ "parts": [{ "text": system }] }),
            );
        }

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key.expose())
            .json(&payload)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LLMError::from_status(Provider::Gemini, status, text));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let parts = data
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| LLMError::ParseError("No candidates in response".to_string()))?;

        let full_text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect();

        if full_text.trim().is_empty() {
            return Err(LLMError::ParseError("Empty content".to_string()));
        }
        Ok(full_text)
    }
}
