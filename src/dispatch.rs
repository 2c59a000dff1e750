//! Routes a query to the selected agent and reduces the result to display text.
//!
//! Every failure past validation is converted to an `Error occurred: ...`
//! answer here; nothing is retried and nothing escapes to the caller.

use crate::agent::{AgentKind, AgentRegistry};
use crate::answer_log::{AnswerLog, FileAnswerLog};
use crate::config::{Prompts, Settings};
use crate::error::{AssistantError, Result};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Notice shown when the input is not a real question.
pub const VALIDATION_NOTICE: &str = "Please write a question.";

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Text shown and spoken to the user.
    pub answer: String,
    /// Whether the answer was written to the log.
    pub persisted: bool,
}

/// Selects an agent, runs it, and persists successful answers.
pub struct Dispatcher {
    registry: AgentRegistry,
    log: Arc<dyn AnswerLog>,
    placeholder: String,
}

impl Dispatcher {
    pub fn new(registry: AgentRegistry, log: Arc<dyn AnswerLog>, placeholder: &str) -> Self {
        Self {
            registry,
            log,
            placeholder: placeholder.to_string(),
        }
    }

    /// Build the production dispatcher: configured agents and the file log.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let registry = AgentRegistry::from_settings(settings, &prompts)?;
        let log = Arc::new(FileAnswerLog::new(settings.log_path()));
        Ok(Self::new(registry, log, &settings.session.placeholder))
    }

    /// Trim the input and reject empty or placeholder text.
    pub fn validate(&self, input: &str) -> Result<String> {
        let query = input.trim();
        if query.is_empty() || query == self.placeholder {
            return Err(AssistantError::Validation(VALIDATION_NOTICE.to_string()));
        }
        Ok(query.to_string())
    }

    /// Handle a query and return only the answer text.
    pub async fn handle(&self, selection: AgentKind, query: &str) -> String {
        self.dispatch(selection, query).await.answer
    }

    /// Handle a query, reporting whether the answer was persisted.
    #[instrument(skip(self, query), fields(id = %Uuid::new_v4(), agent = %selection))]
    pub async fn dispatch(&self, selection: AgentKind, query: &str) -> Dispatch {
        let query = match self.validate(query) {
            Ok(query) => query,
            Err(_) => {
                return Dispatch {
                    answer: VALIDATION_NOTICE.to_string(),
                    persisted: false,
                }
            }
        };

        let agent = self.registry.get(selection);
        let answer = match agent.respond(&query).await {
            Ok(output) => output.into_answer(),
            Err(e) => {
                warn!("Dispatch failed: {}", e);
                return Dispatch {
                    answer: format!("Error occurred: {}", e),
                    persisted: false,
                };
            }
        };

        let persisted = match self.log.append(&query, &answer).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to write answer log: {}", e);
                false
            }
        };

        info!("Answered with {} chars", answer.len());
        Dispatch { answer, persisted }
    }
}
