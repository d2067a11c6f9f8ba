//! Stylist Core Library
//!
//! Domain model, remote clients and the three-agent report pipeline behind
//! the Stylist fashion recommendation service.

pub mod agent;
pub mod backend;
pub mod config;
pub mod credentials;
pub mod error;
pub mod image;
pub mod llm;
pub mod pipeline;
pub mod preferences;
pub mod prompt;
pub mod prompts;
pub mod report;
pub mod session;

pub use backend::{Backends, RemoteBackends};
pub use config::Settings;
pub use credentials::{ApiKey, CredentialUpdate, Credentials};
pub use error::{MissingInput, StylistError, StylistResult};
pub use image::UploadedImage;
pub use pipeline::{Pipeline, PipelineError, PipelineResult, StepKind};
pub use preferences::{ColorPalette, FashionGoal, FocusArea, StylePreferences, StyleTag};
pub use report::{GenerateError, ReportService, REPORT_FILE_NAME, REPORT_MIME_TYPE};
pub use session::{RunPhase, Session, SessionId, SessionStore, StoredReport};
