//! Prompt templates for the agents.
//!
//! Prompts can be customized by placing an `agents.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agents: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// System prompts for the three agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// Research prompt. `{{format_instructions}}` is replaced with the output schema.
    pub research: String,
    pub chat: String,
    pub math: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            research: r#"You are a research assistant. Answer the query and use tools if necessary.

Tools:
- 'web_search' searches the web for current information
- 'wikipedia' looks up an encyclopedia summary for a topic
- 'save_text_to_file' saves text to a file, only when the user asks for it

Wrap the output in this format and do not add extra text:
{{format_instructions}}"#
                .to_string(),

            chat: "You are a friendly and funny assistant. You can answer casually, tell jokes, and chat informally."
                .to_string(),

            math: "You are a math assistant. You can perform calculations and solve mathematical problems accurately."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agents_path = custom_path.join("agents.toml");
            if agents_path.exists() {
                let content = std::fs::read_to_string(&agents_path)?;
                prompts.agents = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.agents.research.contains("{{format_instructions}}"));
        assert!(prompts.agents.chat.contains("jokes"));
        assert!(prompts.agents.math.contains("math assistant"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_with_custom_precedence() {
        let mut custom = HashMap::new();
        custom.insert("name".to_string(), "config".to_string());
        custom.insert("team".to_string(), "ops".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "call".to_string());

        let result = prompts.render_with_custom("{{name}}/{{team}}", &vars);
        assert_eq!(result, "call/ops");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("agents.toml"),
            "math = \"Only answer with numbers.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.agents.math, "Only answer with numbers.");
        // Fields missing from the file keep their defaults
        assert!(prompts.agents.chat.contains("friendly"));
    }
}
