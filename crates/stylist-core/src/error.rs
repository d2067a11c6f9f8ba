//! Centralized error types for Stylist.

use thiserror::Error;

/// Main error type for Stylist domain operations.
#[derive(Error, Debug)]
pub enum StylistError {
    #[error("{0}")]
    MissingInput(#[from] MissingInput),

    #[error("Unknown {field} option: {value}")]
    UnknownOption { field: &'static str, value: String },

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("A report is already being generated for this session")]
    RunInProgress,

    #[error("Template error in '{name}': {message}")]
    Template { name: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report task stopped unexpectedly: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Stylist operations.
pub type StylistResult<T> = Result<T, StylistError>;

impl StylistError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a template error for the named template.
    pub fn template(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            name: name.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by what the user submitted.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::MissingInput(_)
                | Self::UnknownOption { .. }
                | Self::InvalidImage(_)
                | Self::RunInProgress
                | Self::ValidationError(_)
        )
    }
}

/// Inputs that must be present before a report can be generated.
///
/// Checked in declaration order; the first missing one is reported.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInput {
    #[error("Please provide your OpenAI API key in the sidebar.")]
    OpenAiKey,

    #[error("Please provide your SerpAPI key in the sidebar.")]
    SerpApiKey,

    #[error("Please upload a full-body image before generating the report.")]
    Image,
}
