//! Configuration settings for askbox.

use crate::agent::AgentKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub agents: AgentSettings,
    pub tools: ToolSettings,
    pub log: LogSettings,
    pub speech: SpeechSettings,
    pub session: SessionSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Load a `.env` file from the working directory at startup.
    pub load_dotenv: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            load_dotenv: true,
        }
    }
}

/// Language model API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Sent as `HTTP-Referer` when set.
    pub referer: Option<String>,
    /// Sent as `X-Title` when set.
    pub app_title: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_base: "https://openrouter.ai/api/v1".to_string(),
            model: "mistralai/mistral-7b-instruct".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 300,
            referer: Some("http://localhost".to_string()),
            app_title: Some("askbox".to_string()),
        }
    }
}

/// Agent behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Agent selected when a session starts.
    pub default_agent: AgentKind,
    /// Upper bound on model calls in one research run.
    pub max_iterations: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            default_agent: AgentKind::Research,
            max_iterations: 15,
        }
    }
}

/// Research tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Maximum related topics returned by web search.
    pub search_max_results: usize,
    /// Number of Wikipedia pages summarized per lookup.
    pub wiki_top_k: usize,
    /// Maximum characters kept from each Wikipedia summary.
    pub wiki_max_chars: usize,
    /// Wikipedia language edition.
    pub wiki_language: String,
    /// File the save tool appends to.
    pub save_path: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            search_max_results: 5,
            wiki_top_k: 1,
            wiki_max_chars: 100,
            wiki_language: "en".to_string(),
            save_path: "research_output.txt".to_string(),
        }
    }
}

/// Answer log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Append-only question/answer log.
    pub path: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            path: "research_output.txt".to_string(),
        }
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub enabled: bool,
    /// Speech program to run (espeak, say, ...).
    pub program: String,
    /// Words per minute.
    pub rate: u32,
    /// Voice name passed to the program, if any.
    pub voice: Option<String>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        let program = if cfg!(target_os = "macos") { "say" } else { "espeak" };
        Self {
            enabled: true,
            program: program.to_string(),
            rate: 160,
            voice: None,
        }
    }
}

/// Interactive session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Hint shown in the input prompt; never accepted as a question.
    pub placeholder: String,
    pub welcome: String,
    /// Delay before the process exits, so the farewell can be spoken.
    pub exit_delay_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            placeholder: "Type your question here...".to_string(),
            welcome: "Welcome! I am your assistant. Feel free to ask me anything.".to_string(),
            exit_delay_ms: 4500,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AssistantError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("askbox")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded answer log path.
    pub fn log_path(&self) -> PathBuf {
        Self::expand_path(&self.log.path)
    }

    /// Get the expanded save tool path.
    pub fn save_path(&self) -> PathBuf {
        Self::expand_path(&self.tools.save_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.model.api_base, "https://openrouter.ai/api/v1");
        assert_eq!(settings.agents.default_agent, AgentKind::Research);
        assert_eq!(settings.tools.wiki_top_k, 1);
        assert_eq!(settings.session.exit_delay_ms, 4500);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [model]
            model = "openai/gpt-4o-mini"

            [agents]
            default_agent = "math"
            "#,
        )
        .unwrap();
        assert_eq!(settings.model.model, "openai/gpt-4o-mini");
        assert_eq!(settings.model.api_key_env, "OPENAI_API_KEY");
        assert_eq!(settings.agents.default_agent, AgentKind::Math);
        assert_eq!(settings.agents.max_iterations, 15);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.speech.enabled = false;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert!(!loaded.speech.enabled);
        assert_eq!(loaded.log.path, "research_output.txt");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.session.placeholder, "Type your question here...");
    }
}
