//! The set of agents a dispatch can be routed to.

use super::{
    AgentKind, OpenAIChatModel, PromptAgent, ResearchAgent, Respond, ToolContext,
};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::openai::create_client;
use std::collections::HashMap;
use std::sync::Arc;

/// One handler per [`AgentKind`].
#[derive(Clone)]
pub struct AgentRegistry {
    research: Arc<dyn Respond>,
    chat: Arc<dyn Respond>,
    math: Arc<dyn Respond>,
}

impl AgentRegistry {
    /// Build a registry from explicit handlers.
    pub fn new(research: Arc<dyn Respond>, chat: Arc<dyn Respond>, math: Arc<dyn Respond>) -> Self {
        Self {
            research,
            chat,
            math,
        }
    }

    /// Build the production agents from configuration.
    ///
    /// All three share one model API client.
    pub fn from_settings(settings: &Settings, prompts: &Prompts) -> Result<Self> {
        let client = create_client(&settings.model)?;
        let model = Arc::new(OpenAIChatModel::new(client.clone(), &settings.model.model));

        let tools = ToolContext::new(settings.tools.clone(), settings.save_path())?;
        let research = ResearchAgent::new(client, &settings.model.model, tools, prompts)
            .with_max_iterations(settings.agents.max_iterations);

        let no_vars = HashMap::new();
        let chat_prompt = prompts.render_with_custom(&prompts.agents.chat, &no_vars);
        let math_prompt = prompts.render_with_custom(&prompts.agents.math, &no_vars);
        let chat = PromptAgent::new("chat", model.clone(), &chat_prompt);
        let math = PromptAgent::new("math", model, &math_prompt);

        Ok(Self::new(Arc::new(research), Arc::new(chat), Arc::new(math)))
    }

    /// The handler for a selection.
    pub fn get(&self, kind: AgentKind) -> Arc<dyn Respond> {
        match kind {
            AgentKind::Research => self.research.clone(),
            AgentKind::Chat => self.chat.clone(),
            AgentKind::Math => self.math.clone(),
        }
    }
}
