//! Agents: a model, a fixed instruction text and optional web search.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::image::UploadedImage;
use crate::llm::{ChatMessage, ChatModel, ChatRequest, LlmError, LlmResult, ToolCall, ToolSpec, WebSearch};
use crate::prompt::PromptTemplate;

/// Name of the function exposed to models that may search the web.
pub const SEARCH_TOOL_NAME: &str = "search_google";

/// Slot filled with the current time when an agent asks for it.
pub const DATETIME_SLOT: &str = "current_datetime";

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
}

/// A single configured remote-call wrapper.
pub struct Agent {
    name: &'static str,
    model_id: String,
    instructions: PromptTemplate,
    add_datetime: bool,
    model: Arc<dyn ChatModel>,
    search: Option<Arc<dyn WebSearch>>,
    max_tool_rounds: usize,
}

impl Agent {
    pub fn new(
        name: &'static str,
        model_id: impl Into<String>,
        instructions: PromptTemplate,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            name,
            model_id: model_id.into(),
            instructions,
            add_datetime: false,
            model,
            search: None,
            max_tool_rounds: 0,
        }
    }

    /// Give the agent the `search_google` tool.
    pub fn with_search(mut self, search: Arc<dyn WebSearch>, max_tool_rounds: usize) -> Self {
        self.search = Some(search);
        self.max_tool_rounds = max_tool_rounds;
        self
    }

    /// Fill the instructions' `current_datetime` slot on every run.
    pub fn with_datetime(mut self) -> Self {
        self.add_datetime = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Run one invocation and return the model's final text.
    ///
    /// When the agent can search, tool calls requested by the model are
    /// executed and fed back until the model answers with text.
    pub async fn run(&self, prompt: &str, images: &[UploadedImage]) -> LlmResult<String> {
        let system = if self.add_datetime {
            let now = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
            self.instructions.render(&[(DATETIME_SLOT, now.as_str())])?
        } else {
            self.instructions.render(&[])?
        };

        let mut messages = vec![
            ChatMessage::system(system),
            ChatMessage::user_with_images(prompt, images),
        ];
        let tools = if self.search.is_some() {
            vec![search_tool_spec()]
        } else {
            Vec::new()
        };

        let mut rounds = 0;
        loop {
            debug!(agent = self.name, model = %self.model_id, round = rounds, "Agent calling model");
            let completion = self
                .model
                .complete(ChatRequest {
                    model: self.model_id.clone(),
                    messages: messages.clone(),
                    tools: tools.clone(),
                })
                .await?;

            let search = match &self.search {
                Some(search) if !completion.tool_calls.is_empty() => search,
                _ => return Ok(completion.text.unwrap_or_default()),
            };

            if rounds == self.max_tool_rounds {
                return Err(LlmError::ToolLoopExhausted(self.max_tool_rounds));
            }
            rounds += 1;

            let calls = completion.tool_calls.clone();
            messages.push(ChatMessage::assistant_tool_calls(completion.text, completion.tool_calls));
            for call in calls {
                let output = self.execute_tool(search.as_ref(), &call).await?;
                messages.push(ChatMessage::tool_result(call.id, output));
            }
        }
    }

    async fn execute_tool(&self, search: &dyn WebSearch, call: &ToolCall) -> LlmResult<String> {
        if call.name != SEARCH_TOOL_NAME {
            warn!(agent = self.name, tool = %call.name, "Model requested an unknown tool");
            return Ok(format!("Error: unknown tool '{}'", call.name));
        }

        let args: SearchArgs = match serde_json::from_str(&call.arguments) {
            Ok(args) => args,
            Err(e) => {
                warn!(agent = self.name, error = %e, "Model sent invalid search arguments");
                return Ok(format!("Error: invalid arguments for {}: {}", SEARCH_TOOL_NAME, e));
            }
        };

        let hits = search.search(&args.query).await?;
        serde_json::to_string(&hits).map_err(|e| LlmError::Decode {
            service: "search results",
            message: e.to_string(),
        })
    }
}

fn search_tool_spec() -> ToolSpec {
    ToolSpec {
        name: SEARCH_TOOL_NAME.to_string(),
        description: "Search Google and return the top organic results (title, link, snippet)."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "The Google search query." }
            },
            "required": ["query"]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{ScriptedChatModel, ScriptedSearch};
    use crate::llm::{Role, SearchHit};

    fn instructions() -> PromptTemplate {
        PromptTemplate::fixed("test", "Be helpful.").unwrap()
    }

    fn hit() -> SearchHit {
        SearchHit {
            title: "Boho Pastels".to_string(),
            link: "https://example.com/boho".to_string(),
            snippet: None,
        }
    }

    #[tokio::test]
    async fn test_plain_agent_returns_text() {
        let model = Arc::new(ScriptedChatModel::new().reply_text("Hourglass."));
        let agent = Agent::new("Analyzer", "gpt-4o", instructions(), model.clone());

        let text = agent.run("Analyze", &[]).await.unwrap();

        assert_eq!(text, "Hourglass.");
        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o");
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[0].messages[0].text(), "Be helpful.");
        assert!(requests[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_search_agent_executes_tool_calls() {
        let model = Arc::new(
            ScriptedChatModel::new()
                .reply_tool_call("call_1", SEARCH_TOOL_NAME, r#"{"query":"boho pastel outfits"}"#)
                .reply_text("- [Boho Pastels](https://example.com/boho)"),
        );
        let search = Arc::new(ScriptedSearch::new(vec![hit()]));
        let agent = Agent::new("Search", "gpt-4o", instructions(), model.clone())
            .with_search(search.clone(), 3);

        let text = agent.run("Find outfits", &[]).await.unwrap();

        assert_eq!(text, "- [Boho Pastels](https://example.com/boho)");
        assert_eq!(search.queries(), vec!["boho pastel outfits".to_string()]);

        let second = &model.requests()[1];
        assert_eq!(second.tools[0].name, SEARCH_TOOL_NAME);
        let tool_turn = second.messages.last().unwrap();
        assert_eq!(tool_turn.role, Role::Tool);
        assert_eq!(tool_turn.tool_call_id.as_deref(), Some("call_1"));
        assert!(tool_turn.text().contains("https://example.com/boho"));
    }

    #[tokio::test]
    async fn test_bad_tool_arguments_are_reported_to_model() {
        let model = Arc::new(
            ScriptedChatModel::new()
                .reply_tool_call("call_1", SEARCH_TOOL_NAME, "not json")
                .reply_tool_call("call_2", "browse", "{}")
                .reply_text("done"),
        );
        let search = Arc::new(ScriptedSearch::new(vec![hit()]));
        let agent = Agent::new("Search", "gpt-4o", instructions(), model.clone())
            .with_search(search.clone(), 5);

        assert_eq!(agent.run("Find", &[]).await.unwrap(), "done");
        assert!(search.queries().is_empty());
        let last = model.requests()[2].messages.last().unwrap().text();
        assert!(last.contains("unknown tool 'browse'"));
    }

    #[tokio::test]
    async fn test_tool_loop_is_bounded() {
        let model = Arc::new(
            ScriptedChatModel::new()
                .reply_tool_call("a", SEARCH_TOOL_NAME, r#"{"query":"1"}"#)
                .reply_tool_call("b", SEARCH_TOOL_NAME, r#"{"query":"2"}"#),
        );
        let agent = Agent::new("Search", "gpt-4o", instructions(), model.clone())
            .with_search(Arc::new(ScriptedSearch::new(Vec::new())), 1);

        let err = agent.run("Find", &[]).await.unwrap_err();
        assert!(matches!(err, LlmError::ToolLoopExhausted(1)));
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_datetime_slot_is_filled() {
        let template = PromptTemplate::new("dt", "Now: {{ current_datetime }}", &[DATETIME_SLOT]).unwrap();
        let model = Arc::new(ScriptedChatModel::new().reply_text("ok"));
        let agent = Agent::new("Report", "o3-mini", template, model.clone()).with_datetime();

        agent.run("Write", &[]).await.unwrap();

        let system = model.requests()[0].messages[0].text();
        assert!(system.starts_with("Now: "));
        assert!(system.ends_with(" UTC"));
    }
}
