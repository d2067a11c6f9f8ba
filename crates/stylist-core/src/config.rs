//! Service settings.
//!
//! Every field has a default, so a missing file, a partial file or no file
//! at all are all valid. API keys never come from here; they are pasted into
//! the page per session.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{StylistError, StylistResult};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SERPAPI_BASE_URL: &str = "https://serpapi.com";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub models: ModelSettings,
    pub search: SearchSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub openai_base_url: String,
    pub visual_model: String,
    pub search_model: String,
    pub report_model: String,
    pub max_completion_tokens: u32,
    /// Upper bound on tool-call round trips for the search agent.
    pub max_tool_rounds: usize,
    pub request_timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            visual_model: "gpt-4o".to_string(),
            search_model: "gpt-4o".to_string(),
            report_model: "o3-mini".to_string(),
            max_completion_tokens: 4096,
            max_tool_rounds: 5,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub serpapi_base_url: String,
    pub num_results: u32,
    pub request_timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            serpapi_base_url: DEFAULT_SERPAPI_BASE_URL.to_string(),
            num_results: 10,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Sessions untouched for this long are dropped.
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> StylistResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> StylistResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(text: &str) -> StylistResult<Self> {
        let settings: Settings =
            toml::from_str(text).map_err(|e| StylistError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> StylistResult<String> {
        toml::to_string_pretty(self).map_err(|e| StylistError::Config(e.to_string()))
    }

    fn validate(&self) -> StylistResult<()> {
        if self.models.max_tool_rounds == 0 {
            return Err(StylistError::Config(
                "models.max_tool_rounds must be at least 1".to_string(),
            ));
        }
        if self.session.sweep_interval_secs == 0 {
            return Err(StylistError::Config(
                "session.sweep_interval_secs must be at least 1".to_string(),
            ));
        }
        for (key, model) in [
            ("visual_model", &self.models.visual_model),
            ("search_model", &self.models.search_model),
            ("report_model", &self.models.report_model),
        ] {
            if model.trim().is_empty() {
                return Err(StylistError::Config(format!("models.{} must not be empty", key)));
            }
        }
        Ok(())
    }
}
