//! Structured research output and its parser.

use crate::error::{AssistantError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Structured answer produced by the research agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResponse {
    pub topic: String,
    pub summary: String,
    pub sources: Vec<String>,
    pub tools_used: Vec<String>,
}

/// Instructions appended to the research prompt describing the expected JSON.
pub fn format_instructions() -> String {
    let schema = serde_json::json!({
        "type": "object",
        "properties": {
            "topic": { "type": "string", "description": "The research topic" },
            "summary": { "type": "string", "description": "Summary of the findings" },
            "sources": { "type": "array", "items": { "type": "string" }, "description": "Sources consulted" },
            "tools_used": { "type": "array", "items": { "type": "string" }, "description": "Names of the tools used" }
        },
        "required": ["topic", "summary", "sources", "tools_used"]
    });

    format!(
        "The output should be a single JSON object conforming to this schema:\n```\n{}\n```",
        serde_json::to_string_pretty(&schema).unwrap_or_default()
    )
}

/// Parses raw model text into a [`ResearchResponse`].
///
/// Accepts a bare JSON object, a fenced ```json block, or an object
/// surrounded by stray prose.
pub struct ResearchOutputParser {
    fence_regex: Regex,
}

impl ResearchOutputParser {
    pub fn new() -> Self {
        let fence_regex = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("Invalid regex");
        Self { fence_regex }
    }

    pub fn parse(&self, raw: &str) -> Result<ResearchResponse> {
        let candidate = self.extract_json(raw).ok_or_else(|| {
            AssistantError::Parse(format!("no JSON object in output: {}", preview(raw, 120)))
        })?;

        serde_json::from_str(candidate)
            .map_err(|e| AssistantError::Parse(format!("{} in output: {}", e, preview(raw, 120))))
    }

    fn extract_json<'a>(&self, raw: &'a str) -> Option<&'a str> {
        if let Some(caps) = self.fence_regex.captures(raw) {
            return caps.get(1).map(|m| m.as_str());
        }

        let start = raw.find('{')?;
        let end = raw.rfind('}')?;
        (start < end).then(|| &raw[start..=end])
    }
}

impl Default for ResearchOutputParser {
    fn default() -> Self {
        Self::new()
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        format!("{}...", flat.chars().take(max_chars).collect::<String>())
    }
}
