//! Configuration module for askbox.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts};
pub use settings::{
    AgentSettings, GeneralSettings, LogSettings, ModelSettings, PromptSettings, SessionSettings,
    Settings, SpeechSettings, ToolSettings,
};
