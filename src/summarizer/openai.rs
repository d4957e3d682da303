//! OpenAI-compatible chat completion model.

use super::CompletionModel;
use crate::config::AiSettings;
use crate::error::{Result, SummaristError};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 4000;

/// Chat completion model backed by `async-openai`.
pub struct OpenAiModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiModel {
    /// Create a model client from AI settings and an API key.
    pub fn new(settings: &AiSettings, api_key: &str) -> Result<Self> {
        if api_key.is_empty() {
            return Err(SummaristError::Config(
                "API key not configured. Set OPENAI_API_KEY or ai.api_key in config.".to_string(),
            ));
        }

        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&settings.base_url);
        let client = create_client(config, Duration::from_secs(settings.timeout_seconds))?;

        Ok(Self {
            client,
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionModel for OpenAiModel {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| SummaristError::Summarization(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| SummaristError::Summarization(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(TEMPERATURE)
            .max_tokens(MAX_TOKENS)
            .build()
            .map_err(|e| SummaristError::Summarization(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SummaristError::OpenAI(format!("Failed to generate summary: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| SummaristError::Summarization("Empty response from LLM".to_string()))?;

        debug!("Received {} characters from model", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_rejected() {
        let result = OpenAiModel::new(&AiSettings::default(), "");
        assert!(matches!(result, Err(SummaristError::Config(_))));
    }

    #[test]
    fn test_model_name_from_settings() {
        let settings = AiSettings {
            model: "gpt-4o".to_string(),
            ..AiSettings::default()
        };
        let model = OpenAiModel::new(&settings, "sk-test").unwrap();
        assert_eq!(model.model(), "gpt-4o");
    }
}
