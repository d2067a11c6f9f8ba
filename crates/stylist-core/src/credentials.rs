//! API keys pasted into the sidebar.
//!
//! Keys are kept verbatim. Nothing here checks that a key is well-formed or
//! accepted by the remote service; a bad key only shows up as a remote error
//! when a report is generated.

use std::fmt;

use crate::error::MissingInput;

/// An opaque secret. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// The two secrets a session needs before it can generate a report.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<ApiKey>,
    pub serp_api_key: Option<ApiKey>,
}

/// Which keys a credential submission actually replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CredentialUpdate {
    pub openai_updated: bool,
    pub serp_updated: bool,
}

impl Credentials {
    /// Store each non-empty submitted value, overwriting the previous one.
    /// Empty submissions leave the stored key alone.
    pub fn apply(&mut self, openai_api_key: &str, serp_api_key: &str) -> CredentialUpdate {
        let mut update = CredentialUpdate::default();

        if !openai_api_key.is_empty() {
            self.openai_api_key = Some(ApiKey::new(openai_api_key));
            update.openai_updated = true;
        }
        if !serp_api_key.is_empty() {
            self.serp_api_key = Some(ApiKey::new(serp_api_key));
            update.serp_updated = true;
        }

        update
    }

    pub fn has_openai_key(&self) -> bool {
        self.openai_api_key.is_some()
    }

    pub fn has_serp_key(&self) -> bool {
        self.serp_api_key.is_some()
    }

    /// The first key still to be entered, OpenAI before SerpAPI.
    pub fn missing_key(&self) -> Option<MissingInput> {
        if !self.has_openai_key() {
            Some(MissingInput::OpenAiKey)
        } else if !self.has_serp_key() {
            Some(MissingInput::SerpApiKey)
        } else {
            None
        }
    }
}
