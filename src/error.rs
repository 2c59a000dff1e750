//! Error types for askbox.

use thiserror::Error;

/// Library-level error type for askbox operations.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API error: {0}")]
    OpenAI(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Tool failed: {0}")]
    Tool(String),

    #[error("Failed to parse model output: {0}")]
    Parse(String),

    #[error("Speech failed: {0}")]
    Speech(String),
}

/// Result type alias for askbox operations.
pub type Result<T> = std::result::Result<T, AssistantError>;
