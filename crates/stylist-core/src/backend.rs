//! Builds remote clients from a session's keys.

use std::sync::Arc;

use crate::config::{ModelSettings, SearchSettings};
use crate::credentials::ApiKey;
use crate::llm::{ChatModel, OpenAiClient, SerpApiClient, WebSearch};

/// Source of remote collaborators for one report run.
pub trait Backends: Send + Sync {
    fn chat_model(&self, api_key: &ApiKey) -> Arc<dyn ChatModel>;

    fn web_search(&self, api_key: &ApiKey) -> Arc<dyn WebSearch>;
}

/// OpenAI for chat, SerpAPI for search.
pub struct RemoteBackends {
    models: ModelSettings,
    search: SearchSettings,
}

impl RemoteBackends {
    pub fn new(models: ModelSettings, search: SearchSettings) -> Self {
        Self { models, search }
    }
}

impl Backends for RemoteBackends {
    fn chat_model(&self, api_key: &ApiKey) -> Arc<dyn ChatModel> {
        Arc::new(OpenAiClient::new(api_key.clone(), &self.models))
    }

    fn web_search(&self, api_key: &ApiKey) -> Arc<dyn WebSearch> {
        Arc::new(SerpApiClient::new(api_key.clone(), &self.search))
    }
}
