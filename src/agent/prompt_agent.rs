//! Prompt-only agents (chat, math).

use super::{AgentOutput, ChatModel, Respond};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// Agent that sends a fixed system prompt plus the query in one completion.
pub struct PromptAgent {
    name: &'static str,
    model: Arc<dyn ChatModel>,
    system_prompt: String,
}

impl PromptAgent {
    pub fn new(name: &'static str, model: Arc<dyn ChatModel>, system_prompt: &str) -> Self {
        Self {
            name,
            model,
            system_prompt: system_prompt.to_string(),
        }
    }
}

#[async_trait]
impl Respond for PromptAgent {
    #[instrument(skip(self, query), fields(agent = self.name))]
    async fn respond(&self, query: &str) -> Result<AgentOutput> {
        info!("Sending query to {} agent", self.name);
        let content = self.model.complete(&self.system_prompt, query).await?;
        Ok(AgentOutput::Text(content))
    }
}
