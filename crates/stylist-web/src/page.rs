//! The single page: sidebar, preference form and stored result.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use stylist_core::{
    ColorPalette, FashionGoal, FocusArea, RunPhase, Session, StoredReport, StyleTag,
};

use crate::markdown::render_markdown;

#[derive(Template)]
#[template(path = "index.html")]
pub struct PageTemplate {
    pub sidebar_messages: Vec<Flash>,
    pub messages: Vec<Flash>,
    pub openai_key_set: bool,
    pub serp_key_set: bool,
    pub styles: Vec<OptionView>,
    pub colors: Vec<OptionView>,
    pub goals: Vec<OptionView>,
    pub focus_areas: Vec<OptionView>,
    pub running: bool,
    pub result: Option<ResultView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

/// An inline message shown once, in the response that produced it.
#[derive(Debug, Clone)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Success => "flash success",
            FlashKind::Error => "flash error",
        }
    }
}

/// One entry of a select control.
pub struct OptionView {
    pub label: &'static str,
    pub selected: bool,
}

/// View model for the stored report.
pub struct ResultView {
    pub report_html: String,
    pub generated_at: String,
    /// Changes with every run so the browser never shows a stale photo.
    pub image_version: i64,
}

impl ResultView {
    fn from_stored(stored: &StoredReport) -> Self {
        Self {
            report_html: render_markdown(&stored.report),
            generated_at: stored.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            image_version: stored.generated_at.timestamp_millis(),
        }
    }
}

fn multi_options<T: Copy + PartialEq>(
    all: &[T],
    selected: &[T],
    label: fn(&T) -> &'static str,
) -> Vec<OptionView> {
    all.iter()
        .map(|option| OptionView {
            label: label(option),
            selected: selected.contains(option),
        })
        .collect()
}

/// Single selects always have a choice; the first option is the default.
fn single_options<T: Copy + PartialEq>(
    all: &[T],
    selected: Option<T>,
    label: fn(&T) -> &'static str,
) -> Vec<OptionView> {
    let selected = selected.or_else(|| all.first().copied());
    all.iter()
        .map(|option| OptionView {
            label: label(option),
            selected: Some(*option) == selected,
        })
        .collect()
}

impl PageTemplate {
    pub fn for_session(session: &Session) -> Self {
        let prefs = &session.preferences;
        Self {
            sidebar_messages: Vec::new(),
            messages: Vec::new(),
            openai_key_set: session.credentials.has_openai_key(),
            serp_key_set: session.credentials.has_serp_key(),
            styles: multi_options(StyleTag::ALL, &prefs.styles, StyleTag::label),
            colors: multi_options(ColorPalette::ALL, &prefs.colors, ColorPalette::label),
            goals: single_options(FashionGoal::ALL, prefs.goal, FashionGoal::label),
            focus_areas: single_options(FocusArea::ALL, prefs.focus, FocusArea::label),
            running: session.phase() == RunPhase::Running,
            result: session.result().map(|stored| ResultView::from_stored(&stored)),
        }
    }

    pub fn with_sidebar_message(mut self, flash: Flash) -> Self {
        self.sidebar_messages.push(flash);
        self
    }

    pub fn with_message(mut self, flash: Flash) -> Self {
        self.messages.push(flash);
        self
    }

    /// Render with the given status.
    pub fn respond(self, status: StatusCode) -> Response {
        match self.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to render page");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("Template error: {}", e))).into_response()
            }
        }
    }
}
