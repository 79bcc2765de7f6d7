//! OpenRouter client over its OpenAI-compatible chat completions API.

use crate::chat::client::CompletionClient;
use crate::chat::model::AiModel;
use crate::config::GateConfig;
use crate::error::{ChatError, ConfigError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

const SITE_URL: &str = "https://aibitcointutor.com";
const SITE_TITLE: &str = "AI Bitcoin Tutor";
const EMPTY_REPLY: &str = "No response received";

// --- OpenAI-compatible serde structs ---

#[derive(Debug, serde::Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, serde::Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, serde::Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, serde::Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub(crate) fn build_request<'a>(
    model: &'a AiModel,
    system_prompt: &'a str,
    text: &'a str,
) -> ChatRequest<'a> {
    ChatRequest {
        model: &model.id,
        messages: vec![
            ChatMessage { role: "system", content: system_prompt },
            ChatMessage { role: "user", content: text },
        ],
        temperature: model.temperature(),
        max_tokens: model.max_tokens(),
    }
}

pub(crate) fn reply_text(response: ChatResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| EMPTY_REPLY.to_string())
}

/// Client for OpenRouter chat completions.
///
/// The endpoint in [`AiModel::api_endpoint`] wins over the client default, so a model
/// list can point individual models elsewhere.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl OpenRouterClient {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(endpoint = %endpoint, "OpenRouter client configured");
        Ok(Self { client, api_key: api_key.into(), endpoint })
    }

    pub fn from_config(cfg: &GateConfig) -> Result<Self, ConfigError> {
        let key = cfg.require_api_key()?;
        Self::new(key, &cfg.openrouter_endpoint, cfg.request_timeout()).map_err(|e| {
            ConfigError::Invalid { key: "openrouter_endpoint", reason: e.to_string() }
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url_for(&self, model: &AiModel) -> String {
        let base = if model.api_endpoint.is_empty() {
            self.endpoint.as_str()
        } else {
            model.api_endpoint.trim_end_matches('/')
        };
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(
        &self,
        model: &AiModel,
        system_prompt: &str,
        text: &str,
    ) -> Result<String, ChatError> {
        let request = build_request(model, system_prompt, text);
        debug!(model = %model.id, text_len = text.len(), "sending completion request");

        let response = self
            .client
            .post(self.url_for(model))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", SITE_URL)
            .header("X-Title", SITE_TITLE)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "completion request failed");
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            };
            return Err(ChatError::Completion { message, status: Some(status.as_u16()) });
        }

        let body: ChatResponse = response.json().await.map_err(|e| ChatError::Completion {
            message: format!("unreadable response: {}", e),
            status: Some(status.as_u16()),
        })?;
        Ok(reply_text(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::model::default_models;

    #[test]
    fn request_carries_system_and_user_turns() {
        let model = default_models().remove(0);
        let req = build_request(&model, "be nice", "What is a block?");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "perplexity/sonar");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "What is a block?");
        assert_eq!(json["max_tokens"], 4096);
    }

    #[test]
    fn empty_choices_yield_placeholder() {
        let resp: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(reply_text(resp), EMPTY_REPLY);

        let resp: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "Hi"}}]}"#).unwrap();
        assert_eq!(reply_text(resp), "Hi");
    }

    #[test]
    fn model_endpoint_overrides_default() {
        let timeout = Duration::from_secs(5);
        let client = OpenRouterClient::new("k", "https://example.test/api/", timeout).unwrap();
        assert_eq!(client.endpoint(), "https://example.test/api");

        let mut model = default_models().remove(0);
        assert_eq!(client.url_for(&model), "https://openrouter.ai/api/v1/chat/completions");
        model.api_endpoint.clear();
        assert_eq!(client.url_for(&model), "https://example.test/api/chat/completions");
    }

    #[test]
    fn from_config_requires_key() {
        assert!(OpenRouterClient::from_config(&GateConfig::default()).is_err());
    }
}
