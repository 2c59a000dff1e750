//! Single-shot chat completion against the model API.

use crate::error::{AssistantError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// A language model that answers one system+user exchange.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Chat model backed by an OpenAI-compatible endpoint.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIChatModel {
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, system, user), fields(model = %self.model))]
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| AssistantError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| AssistantError::Agent(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| AssistantError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AssistantError::OpenAI(format!("Completion failed: {}", e)))?;

        debug!("Received {} choice(s)", response.choices.len());

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AssistantError::Agent("No response from model".to_string()))
    }
}
