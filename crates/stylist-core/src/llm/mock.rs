//! Scripted in-process collaborators.
//!
//! Used by tests to drive agents and the pipeline without a network.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ChatCompletion, ChatModel, ChatRequest, LlmError, LlmResult, SearchHit, ToolCall, WebSearch};

enum Scripted {
    Reply(ChatCompletion),
    Fail(String),
}

/// A chat model that answers from a queue and records every request.
#[derive(Default)]
pub struct ScriptedChatModel {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a final text answer.
    pub fn reply_text(self, text: impl Into<String>) -> Self {
        self.push(Scripted::Reply(ChatCompletion::text(text)))
    }

    /// Queue a single tool call.
    pub fn reply_tool_call(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        self.push(Scripted::Reply(ChatCompletion {
            text: None,
            tool_calls: vec![ToolCall {
                id: id.into(),
                name: name.into(),
                arguments: arguments.into(),
            }],
        }))
    }

    /// Queue a remote failure.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(Scripted::Fail(message.into()))
    }

    fn push(self, item: Scripted) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(item);
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, request: ChatRequest) -> LlmResult<ChatCompletion> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some(Scripted::Reply(completion)) => Ok(completion),
            Some(Scripted::Fail(body)) => Err(LlmError::Api {
                service: "scripted",
                status: 500,
                body,
            }),
            None => Err(LlmError::Api {
                service: "scripted",
                status: 500,
                body: "no scripted response left".to_string(),
            }),
        }
    }
}

/// A search backend that returns fixed hits and records queries.
#[derive(Default)]
pub struct ScriptedSearch {
    hits: Vec<SearchHit>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl WebSearch for ScriptedSearch {
    async fn search(&self, query: &str) -> LlmResult<Vec<SearchHit>> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.to_string());
        Ok(self.hits.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_runs_dry() {
        let model = ScriptedChatModel::new().reply_text("one").fail("boom");
        let request = ChatRequest {
            model: "m".to_string(),
            messages: Vec::new(),
            tools: Vec::new(),
        };

        assert_eq!(model.complete(request.clone()).await.unwrap().text.as_deref(), Some("one"));
        assert!(model.complete(request.clone()).await.is_err());
        assert!(model.complete(request).await.is_err());
        assert_eq!(model.call_count(), 3);
    }
}
