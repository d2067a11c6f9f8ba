//! OpenAI chat completions client.
//!
//! Sends text, inline images and function tools to `/chat/completions` and
//! returns the first choice.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{
    ChatCompletion, ChatMessage, ChatModel, ChatRequest, ContentPart, LlmError, LlmResult, Role,
    ToolCall, ToolSpec,
};
use crate::config::ModelSettings;
use crate::credentials::ApiKey;

const SERVICE: &str = "OpenAI";

/// Client for the OpenAI chat completions API.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: ApiKey,
    base_url: String,
    max_completion_tokens: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    max_completion_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart {
    Text { text: String },
    ImageUrl { image_url: WireImageUrl },
}

#[derive(Serialize)]
struct WireImageUrl {
    url: String,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

impl OpenAiClient {
    /// Create a client for the given key using the configured endpoint.
    pub fn new(api_key: ApiKey, settings: &ModelSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            api_key,
            base_url: settings.openai_base_url.trim_end_matches('/').to_string(),
            max_completion_tokens: settings.max_completion_tokens,
            client,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> LlmResult<ChatCompletion> {
        let body = CompletionRequest {
            model: &request.model,
            messages: request.messages.into_iter().map(to_wire_message).collect(),
            tools: request.tools.iter().map(to_wire_tool).collect(),
            max_completion_tokens: self.max_completion_tokens,
        };

        debug!(
            model = %request.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "Calling OpenAI chat completions"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|source| LlmError::Http { service: SERVICE, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|source| LlmError::Http { service: SERVICE, source })?;
        let parsed: CompletionResponse = serde_json::from_str(&text).map_err(|e| LlmError::Decode {
            service: SERVICE,
            message: e.to_string(),
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse(SERVICE))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        debug!(
            has_text = choice.message.content.is_some(),
            tool_calls = tool_calls.len(),
            "OpenAI completion received"
        );

        Ok(ChatCompletion {
            text: choice.message.content,
            tool_calls,
        })
    }
}

fn to_wire_message(message: ChatMessage) -> WireMessage {
    let role = match message.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let only_text = message
        .parts
        .iter()
        .all(|part| matches!(part, ContentPart::Text(_)));

    let content = if message.parts.is_empty() {
        None
    } else if only_text {
        Some(WireContent::Text(message.text()))
    } else {
        Some(WireContent::Parts(
            message
                .parts
                .into_iter()
                .map(|part| match part {
                    ContentPart::Text(text) => WirePart::Text { text },
                    ContentPart::ImageUrl(url) => WirePart::ImageUrl {
                        image_url: WireImageUrl { url },
                    },
                })
                .collect(),
        ))
    };

    WireMessage {
        role,
        content,
        tool_calls: message
            .tool_calls
            .into_iter()
            .map(|call| WireToolCall {
                id: call.id,
                kind: "function".to_string(),
                function: WireFunctionCall {
                    name: call.name,
                    arguments: call.arguments,
                },
            })
            .collect(),
        tool_call_id: message.tool_call_id,
    }
}

fn to_wire_tool(tool: &ToolSpec) -> WireTool<'_> {
    WireTool {
        kind: "function",
        function: WireFunction {
            name: &tool.name,
            description: &tool.description,
            parameters: &tool.parameters,
        },
    }
}
