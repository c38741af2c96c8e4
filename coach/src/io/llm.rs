//! LLM delegates for interview stages.
//!
//! Two seams keep stage logic independent of the network:
//!
//! - [`Agent`]: what stages call. Takes prompt messages, returns the full
//!   transcript (input plus generated messages).
//! - [`ChatBackend`]: a single chat-completion round trip. [`ChatAgent`] drives
//!   it, running the tool loop when the model asks for web search.
//!
//! Tests substitute scripted implementations of either trait.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::core::transcript::find_last;
use crate::io::config::CoachConfig;
use crate::io::search::{SearchTool, format_hits};

/// Name of the search tool as advertised to the model.
pub const WEB_SEARCH_TOOL: &str = "web_search";

/// OpenAI-style chat roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as sent by the model.
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

/// One message of a chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn with_role(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(ChatRole::Assistant, content)
    }

    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::with_role(ChatRole::Assistant, "")
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_role(ChatRole::Tool, content)
        }
    }
}

/// Last assistant message with non-empty text. `None` means "no usable output".
pub fn last_assistant_reply(transcript: &[ChatMessage]) -> Option<&str> {
    find_last(transcript, |msg| {
        msg.role == ChatRole::Assistant && !msg.content.trim().is_empty()
    })
    .map(|msg| msg.content.as_str())
}

/// Tool schema advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn web_search() -> Self {
        Self {
            name: WEB_SEARCH_TOOL.to_string(),
            description: "Search the web for up-to-date technical material, documentation and \
                          learning resources."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" }
                },
                "required": ["query"]
            }),
        }
    }
}

/// One chat-completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

/// What the model decided to do in one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Final text answer (possibly empty).
    Text(String),
    /// The model wants tools run before it answers.
    ToolCalls(Vec<ToolCall>),
}

/// Single round trip to a chat-completion endpoint.
pub trait ChatBackend {
    fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}

/// Delegate contract used by every stage.
pub trait Agent {
    /// Run the agent on `messages` and return the full transcript.
    fn invoke(&self, messages: Vec<ChatMessage>) -> Result<Vec<ChatMessage>>;
}

/// Backend for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatibleBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompatibleBackend {
    pub fn new(config: &CoachConfig, api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("build llm http client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": self.temperature,
        });
        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|tool| json!({ "type": "function", "function": tool }))
                .collect();
            body["tools"] = Value::Array(tools);
        }
        body
    }
}

impl ChatBackend for OpenAiCompatibleBackend {
    #[instrument(skip_all, fields(model = %self.model, messages = request.messages.len(), tools = request.tools.len()))]
    fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .send()
            .with_context(|| format!("post {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(%status, "llm request failed");
            bail!("llm api error {status}: {body}");
        }

        let raw: Value = response.json().context("parse llm response json")?;
        parse_completion(&raw)
    }
}

/// Extract the first choice from an OpenAI-format response body.
pub fn parse_completion(raw: &Value) -> Result<Completion> {
    let message = raw
        .pointer("/choices/0/message")
        .ok_or_else(|| anyhow!("llm response has no choices"))?;

    if let Some(calls) = message.get("tool_calls").filter(|v| !v.is_null()) {
        let calls: Vec<ToolCall> =
            serde_json::from_value(calls.clone()).context("parse tool_calls")?;
        if !calls.is_empty() {
            return Ok(Completion::ToolCalls(calls));
        }
    }

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(Completion::Text(content))
}

/// Agent with a fixed system prompt and optional web search.
pub struct ChatAgent {
    name: &'static str,
    system_prompt: String,
    backend: Arc<dyn ChatBackend>,
    search: Option<Arc<dyn SearchTool>>,
    max_tool_rounds: u32,
}

impl ChatAgent {
    pub fn new(
        name: &'static str,
        system_prompt: impl Into<String>,
        backend: Arc<dyn ChatBackend>,
        max_tool_rounds: u32,
    ) -> Self {
        Self {
            name,
            system_prompt: system_prompt.into(),
            backend,
            search: None,
            max_tool_rounds,
        }
    }

    /// Attach web search. Without it the model is never offered tools.
    pub fn with_search(mut self, search: Option<Arc<dyn SearchTool>>) -> Self {
        self.search = search;
        self
    }

    pub fn has_search(&self) -> bool {
        self.search.is_some()
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        if self.search.is_some() {
            vec![ToolDefinition::web_search()]
        } else {
            Vec::new()
        }
    }

    fn run_tool(&self, call: &ToolCall) -> String {
        if call.function.name != WEB_SEARCH_TOOL {
            return format!("Unknown tool: {}", call.function.name);
        }
        let Some(search) = &self.search else {
            return "Web search is not available.".to_string();
        };
        let query = match serde_json::from_str::<Value>(&call.function.arguments) {
            Ok(args) => args["query"].as_str().unwrap_or_default().to_string(),
            Err(err) => return format!("Invalid search arguments: {err}"),
        };
        info!(agent = self.name, %query, "running web search");
        match search.search(&query) {
            Ok(hits) if hits.is_empty() => format!("No results found for: {query}"),
            Ok(hits) => format_hits(&hits),
            Err(err) => {
                warn!(agent = self.name, error = %err, "web search failed");
                format!("Search error: {err}")
            }
        }
    }
}

impl Agent for ChatAgent {
    #[instrument(skip_all, fields(agent = self.name))]
    fn invoke(&self, messages: Vec<ChatMessage>) -> Result<Vec<ChatMessage>> {
        let mut transcript = Vec::with_capacity(messages.len() + 2);
        transcript.push(ChatMessage::system(self.system_prompt.clone()));
        transcript.extend(messages);
        let tools = self.tool_definitions();

        for round in 0..=self.max_tool_rounds {
            let request = CompletionRequest {
                messages: transcript.clone(),
                tools: tools.clone(),
            };
            match self.backend.complete(&request)? {
                Completion::Text(text) => {
                    debug!(round, chars = text.chars().count(), "agent answered");
                    transcript.push(ChatMessage::assistant(text));
                    return Ok(transcript);
                }
                Completion::ToolCalls(calls) => {
                    if round == self.max_tool_rounds {
                        break;
                    }
                    debug!(round, calls = calls.len(), "agent requested tools");
                    let results: Vec<ChatMessage> = calls
                        .iter()
                        .map(|call| ChatMessage::tool_result(call.id.clone(), self.run_tool(call)))
                        .collect();
                    transcript.push(ChatMessage::assistant_tool_calls(calls));
                    transcript.extend(results);
                }
            }
        }

        Err(anyhow!(
            "agent {} still requesting tools after {} rounds",
            self.name,
            self.max_tool_rounds
        ))
    }
}
