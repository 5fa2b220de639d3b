//! LLM client for OpenAI-compatible chat completion APIs (OpenRouter by default)

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ProviderError;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

// ============ Provider Configuration ============

/// Configuration for an LLM API provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL for the API (e.g., "https://openrouter.ai/api/v1")
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Extra headers to include in requests (e.g., X-Title, HTTP-Referer)
    pub extra_headers: Vec<(String, String)>,
    /// Whether to include `transforms: []` in requests (OpenRouter-specific)
    pub include_transforms: bool,
}

impl ProviderConfig {
    /// Create an OpenRouter provider configuration
    pub fn openrouter(api_key: String) -> Self {
        Self {
            base_url: OPENROUTER_BASE_URL.to_string(),
            api_key,
            extra_headers: vec![
                ("HTTP-Referer".to_string(), "https://github.com/cognosys".to_string()),
                ("X-Title".to_string(), "Cognosys".to_string()),
            ],
            include_transforms: true,
        }
    }

    /// Any other OpenAI-compatible endpoint
    pub fn custom(api_key: String, base_url: String) -> Self {
        let include_transforms = base_url.contains("openrouter.ai");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            extra_headers: Vec::new(),
            include_transforms,
        }
    }
}

/// LLM API client
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Arc<Client>,
    provider: ProviderConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transforms: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

impl OpenRouterClient {
    /// Create a client with a specific provider configuration
    pub fn with_provider(config: ProviderConfig) -> Self {
        Self {
            client: Arc::new(Client::new()),
            provider: config,
        }
    }

    /// Send a chat completion request asking for a JSON object back.
    /// Returns the raw text content of the first choice.
    pub async fn complete_json(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        max_tokens: Option<u32>,
    ) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages,
            max_tokens,
            transforms: if self.provider.include_transforms { Some(vec![]) } else { None },
            response_format: Some(ResponseFormat { r#type: "json_object" }),
        };

        let mut req_builder = self.client
            .post(format!("{}/chat/completions", self.provider.base_url))
            .header("Authorization", format!("Bearer {}", self.provider.api_key));
        for (key, value) in &self.provider.extra_headers {
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }
        let response = req_builder.json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { code: status, body });
        }

        let body = response.text().await?;
        tracing::debug!("LLM response: {}", crate::truncate_safe(&body, 2000));

        // Parse as raw Value first for maximum flexibility
        let raw_response: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Parse(format!(
                "{} (body: {})", e, crate::truncate_safe(&body, 500)
            )))?;

        let content = extract_content(&raw_response);
        if content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(content)
    }
}

/// Pull the assistant text out of a completion response, handling both
/// string content and array-of-content-parts formats.
fn extract_content(raw_response: &serde_json::Value) -> String {
    let content_value = raw_response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"));

    match content_value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(parts)) => {
            parts.iter().filter_map(|part| {
                if part.get("type").and_then(|t| t.as_str()) == Some("text") {
                    part.get("text").and_then(|t| t.as_str()).map(|s| s.to_string())
                } else {
                    None
                }
            }).collect::<Vec<_>>().join("")
        }
        _ => String::new(),
    }
}
