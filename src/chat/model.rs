use crate::config::DEFAULT_OPENROUTER_ENDPOINT;
use serde::{Deserialize, Serialize};

/// Persona sent as the system message with every request.
pub const SYSTEM_PROMPT: &str = "You are a knowledgeable and friendly Bitcoin and financial educator. Your role is to provide clear, accurate information about Bitcoin, cryptocurrency, traditional finance, and related topics.

Your expertise includes:
- Bitcoin technology, history, and ecosystem
- Cryptocurrency markets and technologies
- Investment concepts and strategies
- Traditional financial markets (equity, gold, silver, etc.)
- Monetary policy and macroeconomics

When answering questions:
1. Be factual and balanced in your responses
2. Provide citations to reputable sources when possible
3. Explain complex concepts in accessible language
4. Acknowledge different perspectives on controversial topics

IMPORTANT: Always clarify that you provide educational information only, NOT financial advice. Never make price predictions or tell people what to do with their money.

For technical questions, break down your answers into clear steps and explain underlying concepts.";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// A completion model reachable through an OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiModel {
    /// Provider-side identifier, e.g. `perplexity/sonar`.
    pub id: String,
    pub name: String,
    pub provider: String,
    pub api_endpoint: String,
    pub active: bool,
    #[serde(default)]
    pub context_length: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl AiModel {
    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

/// The built-in model list. Exactly one entry is active.
pub fn default_models() -> Vec<AiModel> {
    vec![AiModel {
        id: "perplexity/sonar".into(),
        name: "Perplexity Sonar".into(),
        provider: "OpenRouter".into(),
        api_endpoint: DEFAULT_OPENROUTER_ENDPOINT.into(),
        active: true,
        context_length: Some(32_768),
        temperature: Some(DEFAULT_TEMPERATURE),
        max_tokens: Some(DEFAULT_MAX_TOKENS),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_active_default() {
        let models = default_models();
        assert_eq!(models.iter().filter(|m| m.active).count(), 1);
        assert_eq!(models[0].id, "perplexity/sonar");
        assert_eq!(models[0].max_tokens(), 4096);
    }

    #[test]
    fn unset_parameters_fall_back() {
        let mut model = default_models().remove(0);
        model.temperature = None;
        model.max_tokens = None;
        assert_eq!(model.temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(model.max_tokens(), DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn prompt_disclaims_financial_advice() {
        assert!(SYSTEM_PROMPT.contains("NOT financial advice"));
    }
}
