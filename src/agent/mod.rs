//! Agent system: three configured handlers behind one `respond` interface.
//!
//! The research agent runs a tool-calling loop (web search, Wikipedia,
//! save-to-file) and returns a structured [`ResearchResponse`]. The chat and
//! math agents send a fixed system prompt plus the query in a single
//! completion and return the text verbatim.

mod model;
mod prompt_agent;
mod registry;
mod research;
mod runner;
mod tools;

pub use model::{ChatModel, OpenAIChatModel};
pub use prompt_agent::PromptAgent;
pub use registry::AgentRegistry;
pub use research::{format_instructions, ResearchOutputParser, ResearchResponse};
pub use runner::{ResearchAgent, ToolCallRecord};
pub use tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The agent a query is routed to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Tool-augmented research agent with structured output.
    #[default]
    Research,
    /// Casual conversation and jokes.
    Chat,
    /// Calculations and math problems.
    Math,
}

impl AgentKind {
    pub const ALL: [AgentKind; 3] = [AgentKind::Research, AgentKind::Chat, AgentKind::Math];

    /// Human-readable label for the selector.
    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::Research => "Research Agent",
            AgentKind::Chat => "Chat Agent",
            AgentKind::Math => "Math Agent",
        }
    }
}

impl std::str::FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "research" | "1" => Ok(AgentKind::Research),
            "chat" | "2" => Ok(AgentKind::Chat),
            "math" | "3" => Ok(AgentKind::Math),
            _ => Err(format!("Unknown agent: {}", s)),
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentKind::Research => write!(f, "research"),
            AgentKind::Chat => write!(f, "chat"),
            AgentKind::Math => write!(f, "math"),
        }
    }
}

/// What an agent produced for one query.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutput {
    Research(ResearchResponse),
    Text(String),
}

impl AgentOutput {
    /// Consume the output, keeping only the plain-text answer shown to the
    /// user and written to the log.
    pub fn into_answer(self) -> String {
        match self {
            AgentOutput::Research(response) => response.summary,
            AgentOutput::Text(text) => text,
        }
    }
}

/// A handler that turns a natural-language query into an answer.
#[async_trait]
pub trait Respond: Send + Sync {
    async fn respond(&self, query: &str) -> Result<AgentOutput>;
}
