//! Research agent with tool calling loop.

use super::research::{format_instructions, ResearchOutputParser};
use super::tools::{parse_tool_call, tool_definitions, ToolContext};
use super::{AgentOutput, Respond};
use crate::config::Prompts;
use crate::error::{AssistantError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Agent that researches a query with web, Wikipedia and file tools.
pub struct ResearchAgent {
    client: Client<OpenAIConfig>,
    model: String,
    tools: ToolContext,
    parser: ResearchOutputParser,
    max_iterations: usize,
    system_prompt: String,
}

impl ResearchAgent {
    /// Create a new research agent; the prompt's `{{format_instructions}}` is filled in here.
    pub fn new(client: Client<OpenAIConfig>, model: &str, tools: ToolContext, prompts: &Prompts) -> Self {
        let mut vars = HashMap::new();
        vars.insert("format_instructions".to_string(), format_instructions());
        let system_prompt = prompts.render_with_custom(&prompts.agents.research, &vars);

        Self {
            client,
            model: model.to_string(),
            tools,
            parser: ResearchOutputParser::new(),
            max_iterations: 15,
            system_prompt,
        }
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Run the tool loop until the model produces a final answer.
    ///
    /// Returns the raw final text and the record of tool calls made.
    pub async fn run(&self, query: &str) -> Result<(String, Vec<ToolCallRecord>)> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()
                .map_err(|e| AssistantError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(query)
                .build()
                .map_err(|e| AssistantError::Agent(e.to_string()))?
                .into(),
        ];

        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(AssistantError::Agent(format!(
                    "Agent exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Research iteration {}", iterations);

            let request = CreateChatCompletionRequestArgs::default()
                .model(&self.model)
                .messages(messages.clone())
                .tools(tool_definitions())
                .build()
                .map_err(|e| AssistantError::Agent(e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| AssistantError::OpenAI(format!("Agent API error: {}", e)))?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| AssistantError::Agent("No response from model".to_string()))?;

            let tool_calls = match &choice.message.tool_calls {
                Some(calls) if !calls.is_empty() => calls,
                _ => {
                    let content = choice.message.content.clone().unwrap_or_default();
                    return Ok((content, tool_calls_made));
                }
            };

            let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(tool_calls.clone())
                .build()
                .map_err(|e| AssistantError::Agent(e.to_string()))?;
            messages.push(assistant_msg.into());

            for tool_call in tool_calls {
                let record = self.execute_tool_call(tool_call).await;

                let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(&tool_call.id)
                    .content(record.result.clone())
                    .build()
                    .map_err(|e| AssistantError::Agent(e.to_string()))?;
                messages.push(tool_msg.into());

                tool_calls_made.push(record);
            }
        }
    }

    /// Execute a single tool call and return a record of it.
    ///
    /// Failures become the tool's result text so the model can recover.
    async fn execute_tool_call(&self, tool_call: &ChatCompletionMessageToolCall) -> ToolCallRecord {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        let result = match parse_tool_call(name, arguments) {
            Ok(tool) => match self.tools.execute(&tool).await {
                Ok(output) => output,
                Err(e) => format!("Tool error: {}", e),
            },
            Err(e) => format!("Failed to parse tool call: {}", e),
        };

        let record = ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
        };
        info!("Research agent called tool: {}", record);
        record
    }
}

#[async_trait]
impl Respond for ResearchAgent {
    #[instrument(skip(self, query), fields(model = %self.model))]
    async fn respond(&self, query: &str) -> Result<AgentOutput> {
        let (raw, tool_calls) = self.run(query).await?;
        let mut response = self.parser.parse(&raw)?;

        if response.tools_used.is_empty() {
            response.tools_used = distinct_tool_names(&tool_calls);
        }

        info!(
            "Research finished on '{}' with {} tool call(s)",
            response.topic,
            tool_calls.len()
        );
        Ok(AgentOutput::Research(response))
    }
}

/// Tool names in first-use order, without repeats.
fn distinct_tool_names(records: &[ToolCallRecord]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for record in records {
        if !names.contains(&record.name) {
            names.push(record.name.clone());
        }
    }
    names
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolSettings;
    use crate::openai::create_client;
    use crate::openai::mock_server::{MockServer, Reply};
    use serde_json::Value;
    use std::path::PathBuf;

    const FINAL_ANSWER: &str = r#"{"topic": "Entanglement", "summary": "Shared quantum state.", "sources": ["https://en.wikipedia.org/wiki/Quantum_entanglement"], "tools_used": []}"#;

    fn agent_for(server: &MockServer, save_path: PathBuf) -> ResearchAgent {
        let client = create_client(&server.settings()).unwrap();
        let tools = ToolContext::new(ToolSettings::default(), save_path).unwrap();
        ResearchAgent::new(client, "test-model", tools, &Prompts::default())
    }

    /// Contents of the tool messages sent in one request, in order.
    fn tool_results(request: &Value) -> Vec<String> {
        request["messages"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|m| m["role"] == "tool")
            .map(|m| m["content"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    fn record(name: &str) -> ToolCallRecord {
        ToolCallRecord {
            name: name.to_string(),
            arguments: r#"{"query": "test"}"#.to_string(),
            result: "ok".to_string(),
        }
    }

    #[test]
    fn test_tool_call_record_display() {
        assert_eq!(
            format!("{}", record("web_search")),
            r#"web_search({"query": "test"})"#
        );
    }

    #[test]
    fn test_distinct_tool_names_keeps_first_use_order() {
        let records = vec![record("wikipedia"), record("web_search"), record("wikipedia")];
        assert_eq!(distinct_tool_names(&records), vec!["wikipedia", "web_search"]);
    }

    #[tokio::test]
    async fn test_tool_round_then_structured_answer() {
        let dir = tempfile::tempdir().unwrap();
        let save_path = dir.path().join("research.txt");
        let server = MockServer::start(vec![
            Reply::tool_calls(&[("save_text_to_file", r#"{"data": "Entanglement notes"}"#)]),
            Reply::text(FINAL_ANSWER),
        ])
        .await;
        let agent = agent_for(&server, save_path.clone());

        let output = agent.respond("What is quantum entanglement?").await.unwrap();

        match output {
            AgentOutput::Research(response) => {
                assert_eq!(response.summary, "Shared quantum state.");
                assert_eq!(response.tools_used, vec!["save_text_to_file"]);
            }
            other => panic!("expected research output, got {:?}", other),
        }

        let saved = std::fs::read_to_string(&save_path).unwrap();
        assert!(saved.contains("Entanglement notes"));

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["tools"].as_array().unwrap().len(), 3);
        let system = requests[0]["messages"][0]["content"].as_str().unwrap();
        assert!(system.contains("\"summary\""));
        assert!(!system.contains("{{format_instructions}}"));

        let results = tool_results(&requests[1]);
        assert_eq!(results.len(), 1);
        assert!(results[0].starts_with("Data saved to"));
        let tool_message = requests[1]["messages"]
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["role"] == "tool")
            .unwrap();
        assert_eq!(tool_message["tool_call_id"], "call_0");
    }

    #[tokio::test]
    async fn test_tool_failure_is_fed_back_to_model() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start(vec![
            Reply::tool_calls(&[("save_text_to_file", r#"{"data": "notes"}"#)]),
            Reply::text(FINAL_ANSWER),
        ])
        .await;
        // a directory cannot be opened for appending
        let agent = agent_for(&server, dir.path().to_path_buf());

        let (raw, records) = agent.run("Save my notes").await.unwrap();

        assert_eq!(raw, FINAL_ANSWER);
        assert_eq!(records.len(), 1);
        assert!(records[0].result.starts_with("Tool error:"));

        let results = tool_results(&server.requests()[1]);
        assert_eq!(results, vec![records[0].result.clone()]);
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_arguments_are_fed_back() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start(vec![
            Reply::tool_calls(&[("calculator", "{}"), ("wikipedia", "not json")]),
            Reply::text(FINAL_ANSWER),
        ])
        .await;
        let agent = agent_for(&server, dir.path().join("research.txt"));

        let (_, records) = agent.run("What is 2+2?").await.unwrap();
        assert_eq!(records.len(), 2);

        let results = tool_results(&server.requests()[1]);
        assert_eq!(results.len(), 2);
        assert!(results[0].starts_with("Failed to parse tool call:"));
        assert!(results[0].contains("Unknown tool: calculator"));
        assert!(results[1].starts_with("Failed to parse tool call:"));
        assert!(results[1].contains("Invalid tool arguments"));
    }

    #[tokio::test]
    async fn test_endless_tool_calls_hit_iteration_limit() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start(vec![Reply::tool_calls(&[(
            "save_text_to_file",
            r#"{"data": "again"}"#,
        )])])
        .await;
        let agent = agent_for(&server, dir.path().join("research.txt")).with_max_iterations(2);

        let err = agent.respond("Loop forever").await.unwrap_err();

        match err {
            AssistantError::Agent(msg) => {
                assert_eq!(msg, "Agent exceeded maximum iterations (2)")
            }
            other => panic!("expected agent error, got {:?}", other),
        }
        assert_eq!(server.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_prose_final_answer_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let server =
            MockServer::start(vec![Reply::text("Quantum entanglement links particles.")]).await;
        let agent = agent_for(&server, dir.path().join("research.txt"));

        let err = agent.respond("What is quantum entanglement?").await.unwrap_err();

        assert!(matches!(err, AssistantError::Parse(_)));
        assert_eq!(server.requests().len(), 1);
    }
}
