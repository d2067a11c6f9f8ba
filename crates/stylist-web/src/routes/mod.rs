//! Route handlers.

pub mod credentials;
pub mod generate;
pub mod page;
pub mod report;
pub mod session;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use stylist_core::{Session, SessionId, StylistError};

use crate::state::AppState;

/// Load the current session, or answer 410 if it expired mid-request.
pub(crate) async fn load_session(state: &AppState, id: SessionId) -> Result<Session, Response> {
    state
        .sessions
        .snapshot(id)
        .await
        .map_err(|e| session_gone(id, &e))
}

pub(crate) fn session_gone(id: SessionId, error: &StylistError) -> Response {
    tracing::warn!(session = %id, error = %error, "Session vanished during request");
    (
        StatusCode::GONE,
        "Your session has expired. Reload the page to start a new one.",
    )
        .into_response()
}
