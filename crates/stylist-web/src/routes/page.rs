//! Page rendering.

use axum::{extract::State, http::StatusCode, response::Response, Extension};

use super::load_session;
use crate::page::PageTemplate;
use crate::session::CurrentSession;
use crate::state::AppState;

/// GET / - Render the page for the current session.
pub async fn index(
    State(state): State<AppState>,
    Extension(CurrentSession(id)): Extension<CurrentSession>,
) -> Response {
    match load_session(&state, id).await {
        Ok(session) => PageTemplate::for_session(&session).respond(StatusCode::OK),
        Err(response) => response,
    }
}
