//! Tool definitions and implementations for the research agent.

use crate::config::ToolSettings;
use crate::error::{AssistantError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};
use url::Url;

const DUCKDUCKGO_ENDPOINT: &str = "https://api.duckduckgo.com/";
const USER_AGENT: &str = concat!("askbox/", env!("CARGO_PKG_VERSION"));

/// Available tools for the research agent.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    /// Search the web.
    WebSearch { query: String },

    /// Look up an encyclopedia summary.
    Wikipedia { query: String },

    /// Append text to the research output file.
    SaveTextToFile { data: String },
}

impl ToolCall {
    /// The tool name as advertised to the model.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::WebSearch { .. } => "web_search",
            ToolCall::Wikipedia { .. } => "wikipedia",
            ToolCall::SaveTextToFile { .. } => "save_text_to_file",
        }
    }
}

/// Tool execution context with an HTTP client and tool settings.
pub struct ToolContext {
    http: reqwest::Client,
    settings: ToolSettings,
    save_path: PathBuf,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(settings: ToolSettings, save_path: PathBuf) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            settings,
            save_path,
        })
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        debug!("Executing tool {}", tool.name());
        match tool {
            ToolCall::WebSearch { query } => self.execute_web_search(query).await,
            ToolCall::Wikipedia { query } => self.execute_wikipedia(query).await,
            ToolCall::SaveTextToFile { data } => save_text_to_file(&self.save_path, data).await,
        }
    }

    #[instrument(skip(self))]
    async fn execute_web_search(&self, query: &str) -> Result<String> {
        let url = Url::parse_with_params(
            DUCKDUCKGO_ENDPOINT,
            &[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ],
        )
        .map_err(|e| AssistantError::Tool(format!("Invalid search URL: {}", e)))?;

        let body: Value = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let results = format_search_results(&body, self.settings.search_max_results);
        if results.is_empty() {
            return Ok(format!("No results found for '{}'.", query));
        }
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn execute_wikipedia(&self, query: &str) -> Result<String> {
        let endpoint = format!("https://{}.wikipedia.org/w/api.php", self.settings.wiki_language);
        let limit = self.settings.wiki_top_k.max(1).to_string();

        let search_url = Url::parse_with_params(
            &endpoint,
            &[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
            ],
        )
        .map_err(|e| AssistantError::Tool(format!("Invalid Wikipedia URL: {}", e)))?;

        let search: Value = self
            .http
            .get(search_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let titles = parse_search_titles(&search);
        debug!("Wikipedia search returned {} title(s)", titles.len());
        if titles.is_empty() {
            return Ok("No good Wikipedia Search Result was found".to_string());
        }

        let mut summaries = Vec::with_capacity(titles.len());
        for title in &titles {
            let extract_url = Url::parse_with_params(
                &endpoint,
                &[
                    ("action", "query"),
                    ("prop", "extracts"),
                    ("exintro", "1"),
                    ("explaintext", "1"),
                    ("redirects", "1"),
                    ("titles", title.as_str()),
                    ("format", "json"),
                ],
            )
            .map_err(|e| AssistantError::Tool(format!("Invalid Wikipedia URL: {}", e)))?;

            let page: Value = self
                .http
                .get(extract_url)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            if let Some(extract) = parse_extract(&page) {
                summaries.push(format!("Page: {}\nSummary: {}", title, extract));
            }
        }

        if summaries.is_empty() {
            return Ok("No good Wikipedia Search Result was found".to_string());
        }

        Ok(truncate_chars(&summaries.join("\n\n"), self.settings.wiki_max_chars))
    }
}

/// Append a timestamped research block to `path`.
async fn save_text_to_file(path: &Path, data: &str) -> Result<String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let block = format!("--- Research Output ---\n{}\n\n{}\n\n", timestamp, data);

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(block.as_bytes()).await?;
    file.flush().await?;

    Ok(format!("Data saved to {}", path.display()))
}

/// Flatten a DuckDuckGo Instant Answer response into text.
fn format_search_results(body: &Value, max_results: usize) -> String {
    let mut lines = Vec::new();

    let heading = body["Heading"].as_str().unwrap_or_default();
    let abstract_text = body["AbstractText"].as_str().unwrap_or_default();
    if !abstract_text.is_empty() {
        let source = body["AbstractURL"].as_str().unwrap_or_default();
        lines.push(format!("{}: {} ({})", heading, abstract_text, source));
    }

    if let Some(answer) = body["Answer"].as_str().filter(|a| !a.is_empty()) {
        lines.push(format!("Answer: {}", answer));
    }

    if let Some(definition) = body["Definition"].as_str().filter(|d| !d.is_empty()) {
        lines.push(format!("Definition: {}", definition));
    }

    let mut topics = Vec::new();
    if let Some(related) = body["RelatedTopics"].as_array() {
        collect_topics(related, &mut topics);
    }
    lines.extend(
        topics
            .into_iter()
            .take(max_results)
            .map(|(text, url)| format!("- {} ({})", text, url)),
    );

    lines.join("\n")
}

/// Related topics may be nested one level in named groups.
fn collect_topics(items: &[Value], out: &mut Vec<(String, String)>) {
    for item in items {
        if let Some(nested) = item["Topics"].as_array() {
            collect_topics(nested, out);
        } else if let Some(text) = item["Text"].as_str() {
            let url = item["FirstURL"].as_str().unwrap_or_default();
            out.push((text.to_string(), url.to_string()));
        }
    }
}

fn parse_search_titles(body: &Value) -> Vec<String> {
    body["query"]["search"]
        .as_array()
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_extract(body: &Value) -> Option<String> {
    body["query"]["pages"]
        .as_object()?
        .values()
        .find_map(|page| page["extract"].as_str())
        .map(|extract| extract.trim().to_string())
        .filter(|extract| !extract.is_empty())
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Get OpenAI function/tool definitions for the research agent.
pub fn tool_definitions() -> Vec<async_openai::types::ChatCompletionTool> {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    vec![
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "web_search".to_string(),
                description: Some("Search the web to find information.".to_string()),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query"
                        }
                    },
                    "required": ["query"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "wikipedia".to_string(),
                description: Some(
                    "Look up a topic on Wikipedia and return a short summary of the best match."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The topic to look up"
                        }
                    },
                    "required": ["query"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "save_text_to_file".to_string(),
                description: Some(
                    "Saves the output to a file. Only use this when the user asks for it."
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "data": {
                            "type": "string",
                            "description": "The text to save"
                        }
                    },
                    "required": ["data"]
                })),
                strict: None,
            },
        },
    ]
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: Value = serde_json::from_str(arguments)
        .map_err(|e| AssistantError::Agent(format!("Invalid tool arguments: {}", e)))?;

    let string_arg = |key: &str| -> Result<String> {
        args[key]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AssistantError::Agent(format!("Missing '{}' argument", key)))
    };

    match name {
        "web_search" => Ok(ToolCall::WebSearch {
            query: string_arg("query")?,
        }),
        "wikipedia" => Ok(ToolCall::Wikipedia {
            query: string_arg("query")?,
        }),
        "save_text_to_file" => Ok(ToolCall::SaveTextToFile {
            data: string_arg("data")?,
        }),
        _ => Err(AssistantError::Agent(format!("Unknown tool: {}", name))),
    }
}
